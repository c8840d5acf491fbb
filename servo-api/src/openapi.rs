//! OpenAPI documentation configuration

use utoipa::OpenApi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Servo API",
        version = "2026.10.19",
        description = "Read and set the angle of a PWM hobby servo",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    tags(
        (name = "servo", description = "Servo position"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        handlers::index_handler,
        handlers::get_angle_handler,
        handlers::set_angle_handler,
        handlers::health_handler,
    ),
    components(
        schemas(
            SetAngleRequest,
            AngleResponse,
            ErrorBody,
            HealthCheck,
        )
    )
)]
pub struct ApiDoc;
