use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};

use super::respond;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::CourseService;

#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    responses(
        (status = 200, description = "Published courses", body = [CourseResponse])
    )
)]
pub async fn list_courses(course_service: web::Data<CourseService>) -> Result<HttpResponse> {
    Ok(respond(course_service.list_courses().await))
}

#[utoipa::path(
    post,
    path = "/courses/{id}/purchase",
    tag = "courses",
    params(
        ("id" = i64, Path, description = "Course id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Course purchased", body = PurchaseCourseResponse),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Insufficient credits, details carry the shortage"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled")
    )
)]
pub async fn purchase_course(
    course_service: web::Data<CourseService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(
        course_service.purchase(&user, path.into_inner()).await,
    ))
}

#[utoipa::path(
    get,
    path = "/enrollments",
    tag = "courses",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's enrollments", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_enrollments(
    course_service: web::Data<CourseService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(course_service.list_enrollments(&user).await))
}

pub fn course_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/courses")
            .route("", web::get().to(list_courses))
            .route("/{id}/purchase", web::post().to(purchase_course)),
    )
    .route("/enrollments", web::get().to(list_enrollments));
}
