use utoipa::OpenApi;
use crate::modules::jobs::dto::{CreateAdRequest, SubmitAdResponse};
use crate::modules::jobs::model::{AdJob, JobStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::jobs::handler::submit_ad,
        crate::modules::jobs::handler::get_job_status,
    ),
    components(
        schemas(CreateAdRequest, SubmitAdResponse, AdJob, JobStatus)
    ),
    tags(
        (name = "Jobs", description = "Ad generation jobs")
    )
)]
pub struct ApiDoc;
