use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use vault_backend::services::{now, Deployment, DeploymentSpec};
use vault_backend::types::{
    ApiKey, ClaimResponse, Config, DistributionResponse, GovernanceResponse, ProofResponse,
    RebalanceResponse, RootResponse, StateResponse, VaultDetail, VaultSummary,
};
use yield_vault::constants::MIN_DELAY;
use yield_vault::Address;

struct TestServer {
    base: String,
    client: reqwest::Client,
    spec: DeploymentSpec,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Config::default()).await
    }

    async fn spawn_with(config: Config) -> Self {
        let spec = DeploymentSpec::demo();
        let deployment = Deployment::from_spec(&spec, now()).unwrap();
        let app = vault_backend::app(Arc::new(config), deployment);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            spec,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    async fn post_keyed(&self, path: &str, key: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("x-api-key", key)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    async fn providers(&self) -> Vec<String> {
        let detail: VaultDetail = self.get("/api/vaults/1").await.json().await.unwrap();
        Self::provider_ids(&detail)
    }

    async fn providers_keyed(&self, key: &str) -> Vec<String> {
        let detail: VaultDetail = self
            .client
            .get(self.url("/api/vaults/1"))
            .header("x-api-key", key)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        Self::provider_ids(&detail)
    }

    fn provider_ids(detail: &VaultDetail) -> Vec<String> {
        detail
            .providers
            .iter()
            .map(|view| view.provider.to_string())
            .collect()
    }
}

async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_health_is_open_and_api_is_keyed() {
    let server = TestServer::spawn_with(Config {
        api_keys: vec![ApiKey::unbound("secret")],
        ..Config::default()
    })
    .await;

    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    assert_eq!(
        server.get("/api/vaults").await.status(),
        StatusCode::UNAUTHORIZED
    );

    let response = server
        .client
        .get(server.url("/api/vaults"))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .get(server.url("/api/vaults"))
        .header("x-api-key", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_vault_listing_and_detail() {
    let server = TestServer::spawn().await;

    let vaults: Vec<VaultSummary> = server.get("/api/vaults").await.json().await.unwrap();
    assert_eq!(vaults.len(), 1);
    assert_eq!(vaults[0].vault_id, 1);
    assert_eq!(vaults[0].total_assets, 1_000_000);
    assert!(vaults[0].setup_completed);
    assert!(!vaults[0].paused.deposit);

    let detail: VaultDetail = server.get("/api/vaults/1").await.json().await.unwrap();
    assert_eq!(detail.providers.len(), 2);
    assert_eq!(detail.providers[0].balance, 1_000_000);
    assert_eq!(detail.summary.active_provider, detail.providers[0].provider.to_string());

    let response = server.get("/api/vaults/9").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(response).await, "NOT_FOUND");
}

#[tokio::test]
async fn test_rebalance_through_manager() {
    let server = TestServer::spawn().await;
    let providers = server.providers().await;

    let body = json!({
        "signer": server.spec.executor.to_string(),
        "assets": "max",
        "from": providers[0],
        "to": providers[1],
        "fee": "1000",
        "activate_to": true,
    });
    let response = server.post("/api/vaults/1/rebalance", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let result: RebalanceResponse = response.json().await.unwrap();
    assert!(result.rebalanced);
    assert_eq!(result.total_assets, 999_000);
    assert_eq!(result.providers[0].balance, 0);
    assert_eq!(result.providers[1].balance, 999_000);
    assert!(result.providers[1].active);

    // Admin is not an executor
    let mut body = body;
    body["signer"] = json!(server.spec.admin.to_string());
    body["assets"] = json!("1000");
    let response = server.post("/api/vaults/1/rebalance", &body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(response).await, "UNAUTHORIZED");

    body["signer"] = json!("not-an-address");
    let response = server.post("/api/vaults/1/rebalance", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_ADDRESS");
}

#[tokio::test]
async fn test_bound_key_acts_only_as_its_signers() {
    let executor = DeploymentSpec::demo().executor;
    let server = TestServer::spawn_with(Config {
        api_keys: vec![
            ApiKey::bound("ops", vec![executor]),
            ApiKey::unbound("root"),
        ],
        ..Config::default()
    })
    .await;
    let providers = server.providers_keyed("ops").await;

    let mut body = json!({
        "signer": server.spec.admin.to_string(),
        "assets": "1000",
        "from": providers[0],
        "to": providers[1],
        "fee": "0",
        "activate_to": false,
    });
    let response = server
        .post_keyed("/api/vaults/1/rebalance", "ops", &body)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(response).await, "SIGNER_NOT_ALLOWED");

    // An unbound key reaches the role check instead
    let response = server
        .post_keyed("/api/vaults/1/rebalance", "root", &body)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(response).await, "UNAUTHORIZED");

    body["signer"] = json!(executor.to_string());
    let response = server
        .post_keyed("/api/vaults/1/rebalance", "ops", &body)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let distribution = json!({
        "signer": server.spec.root_updater.to_string(),
        "entries": [],
    });
    let response = server
        .post_keyed("/api/rewards/distribution", "ops", &distribution)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(response).await, "SIGNER_NOT_ALLOWED");
}

#[tokio::test]
async fn test_rebalance_beyond_provider_balance_rejected() {
    let server = TestServer::spawn().await;
    let providers = server.providers().await;

    let body = json!({
        "signer": server.spec.executor.to_string(),
        "assets": "1000001",
        "from": providers[0],
        "to": providers[1],
    });
    let response = server.post("/api/vaults/1/rebalance", &body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, "PRECONDITION_FAILED");

    let detail: VaultDetail = server.get("/api/vaults/1").await.json().await.unwrap();
    assert_eq!(detail.providers[0].balance, 1_000_000);
}

#[tokio::test]
async fn test_reward_distribution_and_claims() {
    let server = TestServer::spawn().await;
    let token = server.spec.reward_funding[0].0.to_string();
    let alice = Address::new_unique().to_string();
    let bob = Address::new_unique().to_string();

    let root: RootResponse = server.get("/api/rewards/root").await.json().await.unwrap();
    assert!(root.root.is_none());

    let distribution = json!({
        "signer": server.spec.root_updater.to_string(),
        "entries": [
            { "account": alice, "token": token, "claimable": "1000" },
            { "account": bob, "token": token, "claimable": "400" },
        ],
    });
    let response = server.post("/api/rewards/distribution", &distribution).await;
    assert_eq!(response.status(), StatusCode::OK);
    let published: DistributionResponse = response.json().await.unwrap();
    assert_eq!(published.entries, 2);

    let root: RootResponse = server.get("/api/rewards/root").await.json().await.unwrap();
    assert_eq!(root.root.as_deref(), Some(published.root.as_str()));

    let proof: ProofResponse = server
        .get(&format!("/api/rewards/proof/{alice}/{token}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(proof.claimable, "1000");
    assert_eq!(proof.claimed, "0");

    // Inflated amount does not verify
    let forged = json!({
        "account": alice,
        "token": token,
        "claimable": "2000",
        "proof": proof.proof,
    });
    let response = server.post("/api/rewards/claim", &forged).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_INPUT");

    let claim = json!({
        "account": alice,
        "token": token,
        "claimable": proof.claimable,
        "proof": proof.proof,
    });
    let response = server.post("/api/rewards/claim", &claim).await;
    assert_eq!(response.status(), StatusCode::OK);
    let claimed: ClaimResponse = response.json().await.unwrap();
    assert_eq!(claimed.amount, 1_000);
    assert_eq!(claimed.total_claimed, 1_000);

    let response = server.post("/api/rewards/claim", &claim).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, "PRECONDITION_FAILED");
}

#[tokio::test]
async fn test_distribution_requires_root_updater() {
    let server = TestServer::spawn().await;
    let distribution = json!({
        "signer": server.spec.admin.to_string(),
        "entries": [{
            "account": Address::new_unique().to_string(),
            "token": server.spec.reward_funding[0].0.to_string(),
            "claimable": "5",
        }],
    });

    let response = server.post("/api/rewards/distribution", &distribution).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .get(&format!(
            "/api/rewards/proof/{}/{}",
            Address::new_unique(),
            Address::new_unique()
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_governance_queue_execute_cancel() {
    let server = TestServer::spawn().await;
    let providers = server.providers().await;
    let request = json!({
        "signer": server.spec.timelock_owner.to_string(),
        "vault_id": 1,
        "eta": now() + MIN_DELAY + 60,
        "call": { "kind": "set_providers", "providers": [providers[0]] },
    });

    let response = server.post("/api/governance/queue", &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let queued: GovernanceResponse = response.json().await.unwrap();
    assert_eq!(queued.status, "queued");
    assert_eq!(queued.signature, "setProviders(address[])");

    let state: StateResponse = server.get("/api/state").await.json().await.unwrap();
    assert_eq!(state.timelock.queued.len(), 1);

    // Still inside the delay
    let response = server.post("/api/governance/execute", &request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, "RETRY_LATER");

    let response = server.post("/api/governance/cancel", &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: GovernanceResponse = response.json().await.unwrap();
    assert_eq!(cancelled.tx_hash, queued.tx_hash);

    let response = server.post("/api/governance/execute", &request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, "PRECONDITION_FAILED");

    let state: StateResponse = server.get("/api/state").await.json().await.unwrap();
    assert!(state.timelock.queued.is_empty());
    assert_eq!(state.vaults[0].providers.len(), 2);
}

#[tokio::test]
async fn test_governance_requires_timelock_owner() {
    let server = TestServer::spawn().await;
    let request = json!({
        "signer": server.spec.admin.to_string(),
        "eta": now() + MIN_DELAY + 60,
        "call": { "kind": "set_delay", "delay": 2 * MIN_DELAY },
    });

    let response = server.post("/api/governance/queue", &request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Eta earlier than the delay allows
    let mut request = request;
    request["signer"] = json!(server.spec.timelock_owner.to_string());
    request["eta"] = json!(now());
    let response = server.post("/api/governance/queue", &request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_INPUT");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let server = TestServer::spawn().await;
    let body = "x".repeat(vault_backend::MAX_BODY_BYTES + 1);

    let response = server
        .client
        .post(server.url("/api/rewards/distribution"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
