pub mod report;

pub use report::{
    DailyRevenue, DashboardCounts, DashboardStats, MethodBreakdown, OverdueSummary, PaymentStats,
    RevenueReport, SeatStatusCount, StatusBreakdown,
};
