// HTTP contract for properties, students, seats, shifts, assignments and
// bookings

#[macro_use]
#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use helpers::{assert_error, read_json, success_data, TestContext};

#[actix_web::test]
async fn test_property_and_student_registration() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.services);

    let req = test::TestRequest::post()
        .uri("/smlekha/properties")
        .set_json(json!({"name": "North Campus", "address": "4 Lake View Road"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CREATED).await;
    assert_eq!(body["message"], "Property created");
    let property_id = success_data(&body)["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/smlekha/properties/{}", property_id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body)["name"], "North Campus");

    let req = test::TestRequest::post()
        .uri("/smlekha/students")
        .set_json(json!({
            "name": "Kiran Rao",
            "email": "Kiran.Rao@Example.com",
            "phone": "9876501234",
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CREATED).await;
    let student = success_data(&body);
    assert_eq!(student["email"], "kiran.rao@example.com");
    assert_eq!(student["isActive"], true);

    let req = test::TestRequest::post()
        .uri("/smlekha/students")
        .set_json(json!({
            "name": "Kiran R",
            "email": "kiran.rao@example.com",
            "phone": "9876501299",
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CONFLICT).await;
    assert_error(&body, "Conflict", "");

    let req = test::TestRequest::post()
        .uri("/smlekha/students")
        .set_json(json!({"name": "No Phone", "phone": "12"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_seat_inventory_routes() {
    let ctx = TestContext::new();
    let property = ctx.create_property("Central Library").await;
    let app = test_app!(ctx.services);

    let req = test::TestRequest::post()
        .uri("/smlekha/seats")
        .set_json(json!({"propertyId": property.id, "seatNumber": "A01"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CREATED).await;
    let seat = success_data(&body);
    assert_eq!(seat["status"], "available");
    let seat_id = seat["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/smlekha/seats")
        .set_json(json!({"propertyId": property.id, "seatNumber": "A01"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CONFLICT).await;
    assert_error(&body, "Conflict", "");

    let req = test::TestRequest::post()
        .uri("/smlekha/seats")
        .set_json(json!({"propertyId": "nowhere", "seatNumber": "Z9"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::NOT_FOUND).await;
    assert_error(&body, "NotFound", "nowhere");

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/seats/{}/status", seat_id))
        .set_json(json!({"status": "maintenance"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body)["status"], "maintenance");

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/seats/{}/status", seat_id))
        .set_json(json!({"status": "occupied"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/smlekha/seats?propertyId={}&status=maintenance",
            property.id
        ))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body).as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::get()
        .uri("/smlekha/seats?status=broken")
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_shift_routes() {
    let ctx = TestContext::new();
    let property = ctx.create_property("Central Library").await;
    let app = test_app!(ctx.services);

    let req = test::TestRequest::post()
        .uri("/smlekha/shifts")
        .set_json(json!({
            "propertyId": property.id,
            "name": "Evening",
            "startTime": "14:00:00",
            "endTime": "20:00:00",
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CREATED).await;
    assert_eq!(success_data(&body)["startTime"], "14:00:00");

    let req = test::TestRequest::post()
        .uri("/smlekha/shifts")
        .set_json(json!({
            "propertyId": property.id,
            "name": "Backwards",
            "startTime": "20:00:00",
            "endTime": "14:00:00",
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/smlekha/shifts?propertyId={}", property.id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body).as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_assignment_routes() {
    let ctx = TestContext::new();
    let property = ctx.create_property("Central Library").await;
    let shift = ctx.create_shift(&property.id, "Morning", 6, 12).await;
    let seat = ctx.create_seat(&property.id, "A12").await;
    let asha = ctx.create_student("Asha Verma", "9876543210").await;
    let ravi = ctx.create_student("Ravi Kumar", "9123456780").await;
    let app = test_app!(ctx.services);

    let req = test::TestRequest::post()
        .uri("/smlekha/assignments")
        .set_json(json!({
            "studentId": asha.id,
            "seatId": seat.id,
            "shiftId": shift.id,
            "monthlyRent": 1800,
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CREATED).await;
    assert_eq!(body["message"], "Seat assigned");
    let data = success_data(&body);
    assert_eq!(data["assignment"]["monthlyRent"], 1800.0);
    assert_eq!(data["assignment"]["status"], "active");
    assert_eq!(data["seat"]["status"], "occupied");
    assert_eq!(data["seat"]["currentStudentId"], asha.id.as_str());
    let assignment_id = data["assignment"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/smlekha/assignments")
        .set_json(json!({"studentId": ravi.id, "seatId": seat.id, "shiftId": shift.id}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CONFLICT).await;
    assert_error(&body, "Conflict", "");

    let req = test::TestRequest::get()
        .uri(&format!("/smlekha/students/{}/assignments", asha.id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body).as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/assignments/{}/release", assignment_id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body)["status"], "ended");

    let req = test::TestRequest::get()
        .uri(&format!("/smlekha/seats/{}", seat.id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body)["status"], "available");

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/assignments/{}/release", assignment_id))
        .set_json(json!({"endDate": "2025-07-01"}))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_booking_routes() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let app = test_app!(ctx.services);

    let req = test::TestRequest::post()
        .uri("/smlekha/bookings")
        .set_json(json!({
            "studentId": seeded.student.id,
            "seatId": seeded.seat.id,
            "shiftId": seeded.shift.id,
            "startDate": "2025-06-01",
            "endDate": "2025-06-10",
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CREATED).await;
    let booking_id = success_data(&body)["id"].as_str().unwrap().to_string();
    assert_eq!(success_data(&body)["status"], "pending");

    let req = test::TestRequest::post()
        .uri("/smlekha/bookings")
        .set_json(json!({
            "studentId": seeded.student.id,
            "seatId": seeded.seat.id,
            "shiftId": seeded.shift.id,
            "startDate": "2025-06-05",
            "endDate": "2025-06-06",
        }))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::CONFLICT).await;
    assert_error(&body, "Conflict", "");

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/bookings/{}/confirm", booking_id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(body["message"], "Booking confirmed");

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/bookings/{}/complete", booking_id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(success_data(&body)["status"], "completed");

    let req = test::TestRequest::put()
        .uri(&format!("/smlekha/bookings/{}/cancel", booking_id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
}
