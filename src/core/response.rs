use actix_web::HttpResponse;
use serde::Serialize;

/// Pagination block attached to list responses
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };

        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Page/limit request parameters, normalised to sane bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Uniform success envelope: `{success, data, pagination?, summary?, message?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize, S: Serialize = ()> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
            summary: None,
            message: None,
        }
    }
}

impl<T: Serialize, S: Serialize> ApiResponse<T, S> {
    pub fn paginated(data: T, pagination: Pagination, summary: Option<S>) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
            summary,
            message: None,
        }
    }

    /// Unpaginated data with an aggregate block
    pub fn summarized(data: T, summary: S) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
            summary: Some(summary),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn into_ok(self) -> HttpResponse {
        HttpResponse::Ok().json(self)
    }

    pub fn into_created(self) -> HttpResponse {
        HttpResponse::Created().json(self)
    }
}
