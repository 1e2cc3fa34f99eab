//! HTTP client for the harvestd API.

use anyhow::{anyhow, Context, Result};
use harvest_core::api::{
    AchievementsRequest, AchievementsResponse, CollectRequest, CollectResponse, EvaluateRequest,
    EvaluateResponse, HealthResponse, LoginRequest, LoginResponse, RankingResponse,
    RegisterRequest, RegisterResponse, ResourcesRequest, ResourcesResponse, SellAllRequest,
    SellAllResponse, SellRequest, SellResponse, UpgradeRequest, UpgradeResponse,
};
use harvest_core::models::UserId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default daemon address, matching harvestd's default bind.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:7860";

pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn post<Req: Serialize, Resp: DeserializeOwned>(&self, path: &str, body: &Req) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("daemon unreachable at {url}"))?;
        Self::decode(response)
    }

    fn get<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("daemon unreachable at {url}"))?;
        Self::decode(response)
    }

    fn decode<Resp: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<Resp> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(anyhow!("{}: {}", status, message));
        }
        response.json().context("malformed response from daemon")
    }

    pub fn register(&self, username: &str, password: &str) -> Result<RegisterResponse> {
        self.post(
            "/v1/auth/register",
            &RegisterRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        )
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        self.post(
            "/v1/auth/login",
            &LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        )
    }

    pub fn collect(&self, user_id: UserId, product: &str) -> Result<CollectResponse> {
        self.post(
            "/v1/game/collect",
            &CollectRequest {
                user_id,
                product: product.to_string(),
            },
        )
    }

    pub fn sell(&self, user_id: UserId, product: &str, quantity: i64) -> Result<SellResponse> {
        self.post(
            "/v1/game/sell",
            &SellRequest {
                user_id,
                product: product.to_string(),
                quantity,
            },
        )
    }

    pub fn sell_all(&self, user_id: UserId) -> Result<SellAllResponse> {
        self.post("/v1/game/sell-all", &SellAllRequest { user_id })
    }

    pub fn upgrade(&self, user_id: UserId, product: &str) -> Result<UpgradeResponse> {
        self.post(
            "/v1/game/upgrade",
            &UpgradeRequest {
                user_id,
                product: product.to_string(),
            },
        )
    }

    pub fn resources(&self, user_id: UserId) -> Result<ResourcesResponse> {
        self.post("/v1/game/resources/list", &ResourcesRequest { user_id })
    }

    pub fn achievements(&self, user_id: UserId) -> Result<AchievementsResponse> {
        self.post("/v1/achievements/list", &AchievementsRequest { user_id })
    }

    pub fn evaluate(&self, user_id: UserId) -> Result<EvaluateResponse> {
        self.post("/v1/achievements/evaluate", &EvaluateRequest { user_id })
    }

    pub fn ranking(&self, limit: Option<i64>) -> Result<RankingResponse> {
        match limit {
            Some(limit) => self.get(&format!("/v1/ranking?limit={limit}")),
            None => self.get("/v1/ranking"),
        }
    }

    pub fn health(&self) -> Result<HealthResponse> {
        self.get("/v1/health")
    }
}
