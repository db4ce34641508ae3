//! HTTP adapter: Implementation of the backend API ports over reqwest.
//!
//! Every call issues a single request; there are no retries. Failures are
//! mapped to `ApiError` and left to the application layer to handle.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::domain::{parse_timestamp, Credential, FeatureVector, HistoryEntry, RiskFactor, RiskScore};
use crate::ports::{
    AccountApi, AccountCredentials, AdminUserEntry, ApiError, PlatformStats, PredictionApi,
    ProfileUpdate, PublicUserEntry, RemotePrediction, StatisticsApi,
};

const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Endpoint URLs derived from the backend base URL.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base: Url,
}

impl ApiEndpoints {
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Only fails for cannot-be-a-base URLs, which config rejects.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    #[must_use]
    pub fn register(&self) -> Url {
        self.endpoint(&["register"])
    }

    #[must_use]
    pub fn login(&self) -> Url {
        self.endpoint(&["login"])
    }

    #[must_use]
    pub fn update_user(&self, username: &str) -> Url {
        self.endpoint(&["users", username])
    }

    #[must_use]
    pub fn predict(&self) -> Url {
        self.endpoint(&["predict"])
    }

    #[must_use]
    pub fn history(&self) -> Url {
        self.endpoint(&["history"])
    }

    #[must_use]
    pub fn admin_users(&self) -> Url {
        self.endpoint(&["admin", "users"])
    }

    #[must_use]
    pub fn public_users(&self) -> Url {
        self.endpoint(&["users"])
    }

    #[must_use]
    pub fn stats_users_total(&self) -> Url {
        self.endpoint(&["stats", "users", "total"])
    }

    #[must_use]
    pub fn stats_predictions_total(&self) -> Url {
        self.endpoint(&["stats", "predictions", "total"])
    }

    #[must_use]
    pub fn stats_predictions_monthly(&self) -> Url {
        self.endpoint(&["stats", "predictions", "monthly"])
    }

    #[must_use]
    pub fn stats_predictions_daily(&self) -> Url {
        self.endpoint(&["stats", "predictions", "daily"])
    }

    #[must_use]
    pub fn stats_risk_average(&self) -> Url {
        self.endpoint(&["stats", "risk", "average"])
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    api_key: &'a str,
    data: &'a FeatureVector,
}

#[derive(Deserialize)]
struct PredictResponse {
    /// Percentage, 0..100
    prediction: f64,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    risk_factors: Option<Vec<RiskFactor>>,
}

#[derive(Deserialize)]
struct HistoryEntryWire {
    id: i64,
    user_id: i64,
    timestamp: String,
    #[serde(default)]
    inputs: serde_json::Map<String, serde_json::Value>,
    prediction: f64,
    #[serde(default)]
    risk_factors: Vec<RiskFactor>,
}

#[derive(Deserialize)]
struct ApiKeyResponse {
    api_key: String,
}

#[derive(Serialize)]
struct UpdateUserRequest<'a> {
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_password: Option<&'a str>,
}

#[derive(Deserialize)]
struct UpdateUserResponse {
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct UsersResponse<T> {
    users: Vec<T>,
}

#[derive(Deserialize)]
struct TotalUsers {
    total_users: u64,
}

#[derive(Deserialize)]
struct TotalPredictions {
    total_predictions: u64,
}

#[derive(Deserialize)]
struct MonthlyPredictions {
    monthly_predictions: u64,
}

#[derive(Deserialize)]
struct DailyPredictions {
    daily_predictions: u64,
}

#[derive(Deserialize)]
struct AverageRisk {
    /// Percentage, 0..100
    average_risk: f64,
}

/// Blocking HTTP client for the prediction backend.
pub struct HttpApiClient {
    client: Client,
    endpoints: ApiEndpoints,
}

impl HttpApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Request` if the TLS backend cannot be initialized.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("cardiopredict/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoints: ApiEndpoints::new(config.api_url.clone()),
        })
    }

    /// Send a request and check its status, without reading the body.
    fn execute(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response, ApiError> {
        let response = request.send().map_err(|e| {
            // Strip the URL: it can carry the api_key query parameter.
            ApiError::Transport(e.without_url().to_string())
        })?;

        let status = response.status();
        tracing::debug!("{} -> {}", response.url().path(), status);

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }
        Ok(response)
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.execute(request)?
            .json::<T>()
            .map_err(|e| ApiError::Decode(e.without_url().to_string()))
    }
}

impl PredictionApi for HttpApiClient {
    fn predict(
        &self,
        credential: &Credential,
        features: &FeatureVector,
    ) -> Result<RemotePrediction, ApiError> {
        let body = PredictRequest {
            api_key: credential.expose(),
            data: features,
        };
        let response: PredictResponse =
            self.send_json(self.client.post(self.endpoints.predict()).json(&body))?;

        let timestamp = response.timestamp.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                tracing::debug!("Ignoring unparseable prediction timestamp {:?}", raw);
            }
            parsed
        });

        Ok(RemotePrediction {
            risk_score: RiskScore::from_percent(response.prediction),
            risk_factors: response.risk_factors,
            timestamp,
        })
    }

    fn history(&self, credential: &Credential) -> Result<Vec<HistoryEntry>, ApiError> {
        let request = self
            .client
            .get(self.endpoints.history())
            .query(&[("api_key", credential.expose())]);
        let entries: Vec<HistoryEntryWire> = self.send_json(request)?;

        entries
            .into_iter()
            .map(|wire| {
                let timestamp = parse_timestamp(&wire.timestamp).ok_or_else(|| {
                    ApiError::Decode(format!(
                        "history entry {} has invalid timestamp {:?}",
                        wire.id, wire.timestamp
                    ))
                })?;
                Ok(HistoryEntry {
                    id: wire.id,
                    user_id: wire.user_id,
                    timestamp,
                    inputs: wire.inputs,
                    risk_score: RiskScore::from_percent(wire.prediction),
                    risk_factors: wire.risk_factors,
                })
            })
            .collect()
    }
}

impl AccountApi for HttpApiClient {
    fn register(&self, account: &AccountCredentials) -> Result<Credential, ApiError> {
        let response: ApiKeyResponse =
            self.send_json(self.client.post(self.endpoints.register()).json(account))?;
        Ok(Credential::new(response.api_key))
    }

    fn login(&self, account: &AccountCredentials) -> Result<Credential, ApiError> {
        let response: ApiKeyResponse =
            self.send_json(self.client.post(self.endpoints.login()).json(account))?;
        Ok(Credential::new(response.api_key))
    }

    fn update_user(
        &self,
        username: &str,
        credential: &Credential,
        update: &ProfileUpdate,
    ) -> Result<Option<Credential>, ApiError> {
        let body = UpdateUserRequest {
            api_key: credential.expose(),
            new_username: update.new_username.as_deref(),
            new_password: update.new_password.as_deref(),
        };
        let text = self
            .execute(self.client.put(self.endpoints.update_user(username)).json(&body))?
            .text()
            .map_err(|e| ApiError::Decode(e.without_url().to_string()))?;

        if text.trim().is_empty() {
            return Ok(None);
        }
        let response: UpdateUserResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(response
            .api_key
            .filter(|key| !key.trim().is_empty())
            .map(Credential::new))
    }

    fn admin_users(&self, admin_key: &str) -> Result<Vec<AdminUserEntry>, ApiError> {
        let request = self
            .client
            .get(self.endpoints.admin_users())
            .header(ADMIN_KEY_HEADER, admin_key);
        let response: UsersResponse<AdminUserEntry> = self.send_json(request)?;
        Ok(response.users)
    }

    fn public_users(&self) -> Result<Vec<PublicUserEntry>, ApiError> {
        let response: UsersResponse<PublicUserEntry> =
            self.send_json(self.client.get(self.endpoints.public_users()))?;
        Ok(response.users)
    }
}

impl StatisticsApi for HttpApiClient {
    fn total_users(&self) -> Result<u64, ApiError> {
        let response: TotalUsers =
            self.send_json(self.client.get(self.endpoints.stats_users_total()))?;
        Ok(response.total_users)
    }

    fn prediction_stats(&self) -> Result<PlatformStats, ApiError> {
        let total: TotalPredictions =
            self.send_json(self.client.get(self.endpoints.stats_predictions_total()))?;
        let monthly: MonthlyPredictions =
            self.send_json(self.client.get(self.endpoints.stats_predictions_monthly()))?;
        let daily: DailyPredictions =
            self.send_json(self.client.get(self.endpoints.stats_predictions_daily()))?;
        let risk: AverageRisk =
            self.send_json(self.client.get(self.endpoints.stats_risk_average()))?;

        Ok(PlatformStats {
            total_predictions: total.total_predictions,
            monthly_predictions: monthly.monthly_predictions,
            daily_predictions: daily.daily_predictions,
            average_risk: RiskScore::from_percent(risk.average_risk),
        })
    }
}
