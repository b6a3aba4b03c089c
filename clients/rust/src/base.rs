use barbershop_booking_api_structs::ErrorResponse;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

pub(crate) struct BaseClient {
    client: Client,
    address: String,
}

#[derive(Debug)]
pub struct APIErrorVariant {
    pub status: StatusCode,
    /// The `{error, message}` body, when the server sent one
    pub body: Option<ErrorResponse>,
}

#[derive(Debug)]
pub enum APIError {
    Network,
    MalformedResponse,
    UnexpectedStatusCode(APIErrorVariant),
}

impl APIError {
    /// Error code of the response body, e.g. `expired`
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::UnexpectedStatusCode(APIErrorVariant {
                body: Some(body), ..
            }) => Some(&body.error),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatusCode(variant) => Some(variant.status),
            _ => None,
        }
    }
}

pub type APIResponse<T> = Result<T, APIError>;

impl BaseClient {
    pub fn new(address: String) -> Self {
        Self {
            client: Client::new(),
            address,
        }
    }

    fn get_client(&self, method: Method, path: String) -> RequestBuilder {
        let url = format!("{}/{}", self.address, path);
        self.client.request(method, &url)
    }

    async fn handle_api_response<T: for<'de> Deserialize<'de>>(
        &self,
        res: Response,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let status = res.status();
        if status != expected_status_code {
            let body = res.json::<ErrorResponse>().await.ok();
            return Err(APIError::UnexpectedStatusCode(APIErrorVariant { status, body }));
        }
        res.json::<T>()
            .await
            .map_err(|_| APIError::MalformedResponse)
    }

    pub async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::GET, path).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::Network),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    pub async fn post<T: for<'de> Deserialize<'de>, S: Serialize>(
        &self,
        body: S,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::POST, path).json(&body).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::Network),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    /// POST without a request body
    pub async fn trigger<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::POST, path).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::Network),
        };
        self.handle_api_response(res, expected_status_code).await
    }
}
