//! Student profile endpoints (`/api/students/profile`), all bearer-authenticated.

use reqwest::Method;

use super::ApiClient;
use crate::error::ApiError;
use crate::types::{CreateStudentProfileRequest, StudentProfile, UpdateStudentProfileRequest};

pub const STUDENT_PROFILE_ENDPOINT: &str = "/api/students/profile";

/// Student profile CRUD bound to an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct StudentsApi {
    client: ApiClient,
}

impl StudentsApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /api/students/profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the server rejects it.
    pub async fn create_profile(
        &self,
        access_token: &str,
        request: &CreateStudentProfileRequest,
    ) -> Result<StudentProfile, ApiError> {
        self.client
            .request(Method::POST, STUDENT_PROFILE_ENDPOINT, Some(request), Some(access_token))
            .await
    }

    /// `GET /api/students/profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or no profile exists.
    pub async fn get_profile(&self, access_token: &str) -> Result<StudentProfile, ApiError> {
        self.client
            .request::<(), _>(Method::GET, STUDENT_PROFILE_ENDPOINT, None, Some(access_token))
            .await
    }

    /// `PUT /api/students/profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the server rejects it.
    pub async fn update_profile(
        &self,
        access_token: &str,
        request: &UpdateStudentProfileRequest,
    ) -> Result<StudentProfile, ApiError> {
        self.client
            .request(Method::PUT, STUDENT_PROFILE_ENDPOINT, Some(request), Some(access_token))
            .await
    }
}
