//! REST API handlers for proposal coordination

use crate::core::{decode_hex, Address, Proposal, Signature, TxHash};
use crate::multisig::{
    ApprovalOutcome, ExecutionOutcome, MultisigCoordinator, MultisigError, ProposalOutcome,
    SafeStatus,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<RwLock<MultisigCoordinator>>,
    /// Chain served by this instance, readable without the coordinator lock
    pub chain: String,
}

impl ApiState {
    pub fn new(coordinator: MultisigCoordinator) -> Self {
        let chain = coordinator.chain().to_string();
        Self {
            coordinator: Arc::new(RwLock::new(coordinator)),
            chain,
        }
    }
}

type ApiFailure = (StatusCode, Json<ApiError>);

type ApiResult<T> = Result<Json<T>, ApiFailure>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub chain: String,
}

/// Where a proposal stands against the current threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalStatus {
    Proposed,
    ThresholdMet,
    Executed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInfo {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub status: ProposalStatus,
    pub threshold: u64,
}

impl ProposalInfo {
    fn new(proposal: Proposal, threshold: u64) -> Self {
        let status = if proposal.is_executed() {
            ProposalStatus::Executed
        } else if proposal.signature_count() as u64 >= threshold {
            ProposalStatus::ThresholdMet
        } else {
            ProposalStatus::Proposed
        };
        Self {
            proposal,
            status,
            threshold,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    pub created: bool,
    pub proposal: Proposal,
}

impl From<ProposalOutcome> for ProposeResponse {
    fn from(outcome: ProposalOutcome) -> Self {
        let created = outcome.is_new();
        let proposal = match outcome {
            ProposalOutcome::Created(p) | ProposalOutcome::AlreadyExists(p) => p,
        };
        Self { created, proposal }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ProposalQuery {
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddOwnerRequest {
    pub owner: Address,
    pub threshold: u64,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveOwnerRequest {
    pub owner: Address,
    pub threshold: u64,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOwnerRequest {
    pub old_owner: Address,
    pub new_owner: Address,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub threshold: u64,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub contract: String,
    pub implementation: Address,
    #[serde(default)]
    pub remark: String,
}

/// A signature produced off-server; private keys never reach the API
#[derive(Debug, Deserialize)]
pub struct SignatureRequest {
    pub signer: Address,
    /// `0x`-prefixed 65-byte `r || s || v`
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub executor: Address,
}

// ============================================================================
// Error mapping
// ============================================================================

fn error_status(e: &MultisigError) -> StatusCode {
    match e {
        MultisigError::NotFound(_) => StatusCode::NOT_FOUND,
        MultisigError::UnauthorizedSigner(_) => StatusCode::FORBIDDEN,
        MultisigError::DuplicateSigner(_)
        | MultisigError::DuplicateProposal(_)
        | MultisigError::AlreadyExecuted(_)
        | MultisigError::StaleNonce { .. } => StatusCode::CONFLICT,
        MultisigError::ThresholdNotMet { .. }
        | MultisigError::InputMissing(_)
        | MultisigError::NotAnOwner(_)
        | MultisigError::InvalidSignature
        | MultisigError::InvalidThreshold(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MultisigError::AuthorityCallFailed { .. } => StatusCode::BAD_GATEWAY,
        MultisigError::Storage(_) | MultisigError::CryptoError(_) | MultisigError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(e: MultisigError) -> ApiFailure {
    (
        error_status(&e),
        Json(ApiError {
            error: e.to_string(),
        }),
    )
}

fn bad_input(message: String) -> ApiFailure {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiError { error: message }),
    )
}

fn parse_hash(hash: &str) -> Result<TxHash, ApiFailure> {
    hash.parse()
        .map_err(|e| bad_input(format!("Invalid proposal hash: {}", e)))
}

fn join_error(e: tokio::task::JoinError) -> ApiFailure {
    log::error!("Coordinator task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: "internal error".to_string(),
        }),
    )
}

// Coordinator calls block on file locks and authority I/O, so they run on
// the blocking pool rather than on a runtime worker.

/// Run `call` against the coordinator under the shared lock
async fn read_coordinator<T, F>(state: &ApiState, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&MultisigCoordinator) -> Result<T, ApiFailure> + Send + 'static,
{
    let coordinator = Arc::clone(&state.coordinator);
    tokio::task::spawn_blocking(move || {
        let guard = coordinator.blocking_read();
        call(&*guard)
    })
        .await
        .map_err(join_error)?
        .map(Json)
}

/// Run `call` against the coordinator under the exclusive lock
async fn write_coordinator<T, F>(state: &ApiState, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut MultisigCoordinator) -> Result<T, ApiFailure> + Send + 'static,
{
    let coordinator = Arc::clone(&state.coordinator);
    tokio::task::spawn_blocking(move || {
        let mut guard = coordinator.blocking_write();
        call(&mut *guard)
    })
        .await
        .map_err(join_error)?
        .map(Json)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        chain: state.chain.clone(),
    })
}

/// GET /api/safe - Owners, threshold and nonce of the Safe
pub async fn get_safe(State(state): State<ApiState>) -> ApiResult<SafeStatus> {
    read_coordinator(&state, |coordinator| coordinator.safe_status().map_err(api_error)).await
}

/// GET /api/proposals - List proposals (`?pending=true` for unexecuted only)
pub async fn list_proposals(
    State(state): State<ApiState>,
    Query(query): Query<ProposalQuery>,
) -> ApiResult<Vec<ProposalInfo>> {
    read_coordinator(&state, move |coordinator| {
        let proposals = if query.pending {
            coordinator.pending()
        } else {
            coordinator.proposals()
        }
        .map_err(api_error)?;
        let threshold = coordinator.safe_status().map_err(api_error)?.threshold;

        Ok(proposals
            .into_iter()
            .map(|p| ProposalInfo::new(p, threshold))
            .collect())
    })
    .await
}

/// GET /api/proposals/{hash} - Get a proposal
pub async fn get_proposal(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
) -> ApiResult<ProposalInfo> {
    let hash = parse_hash(&hash)?;
    read_coordinator(&state, move |coordinator| {
        let proposal = coordinator.proposal(&hash).map_err(api_error)?;
        let threshold = coordinator.safe_status().map_err(api_error)?.threshold;
        Ok(ProposalInfo::new(proposal, threshold))
    })
    .await
}

/// POST /api/proposals/owners/add - Propose adding an owner
pub async fn propose_add_owner(
    State(state): State<ApiState>,
    Json(req): Json<AddOwnerRequest>,
) -> ApiResult<ProposeResponse> {
    read_coordinator(&state, move |coordinator| {
        coordinator
            .propose_add_owner(req.owner, req.threshold, &req.remark)
            .map(ProposeResponse::from)
            .map_err(api_error)
    })
    .await
}

/// POST /api/proposals/owners/remove - Propose removing an owner
pub async fn propose_remove_owner(
    State(state): State<ApiState>,
    Json(req): Json<RemoveOwnerRequest>,
) -> ApiResult<ProposeResponse> {
    read_coordinator(&state, move |coordinator| {
        coordinator
            .propose_remove_owner(req.owner, req.threshold, &req.remark)
            .map(ProposeResponse::from)
            .map_err(api_error)
    })
    .await
}

/// POST /api/proposals/owners/swap - Propose replacing an owner
pub async fn propose_swap_owner(
    State(state): State<ApiState>,
    Json(req): Json<SwapOwnerRequest>,
) -> ApiResult<ProposeResponse> {
    read_coordinator(&state, move |coordinator| {
        coordinator
            .propose_swap_owner(req.old_owner, req.new_owner, &req.remark)
            .map(ProposeResponse::from)
            .map_err(api_error)
    })
    .await
}

/// POST /api/proposals/threshold - Propose a new threshold
pub async fn propose_threshold(
    State(state): State<ApiState>,
    Json(req): Json<ThresholdRequest>,
) -> ApiResult<ProposeResponse> {
    read_coordinator(&state, move |coordinator| {
        coordinator
            .propose_change_threshold(req.threshold, &req.remark)
            .map(ProposeResponse::from)
            .map_err(api_error)
    })
    .await
}

/// POST /api/proposals/upgrade - Propose a proxy upgrade
pub async fn propose_upgrade(
    State(state): State<ApiState>,
    Json(req): Json<UpgradeRequest>,
) -> ApiResult<ProposeResponse> {
    read_coordinator(&state, move |coordinator| {
        coordinator
            .propose_upgrade(&req.contract, req.implementation, &req.remark)
            .map(ProposeResponse::from)
            .map_err(api_error)
    })
    .await
}

/// POST /api/proposals/{hash}/signatures - Add a signature
pub async fn submit_signature(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
    Json(req): Json<SignatureRequest>,
) -> ApiResult<ApprovalOutcome> {
    let hash = parse_hash(&hash)?;
    let payload = decode_hex(&req.signature)
        .map_err(|e| bad_input(format!("Invalid signature: {}", e)))?;
    let signature = Signature::new(req.signer, payload)
        .map_err(|e| bad_input(format!("Invalid signature: {}", e)))?;

    read_coordinator(&state, move |coordinator| {
        coordinator
            .submit_signature(&hash, signature)
            .map_err(api_error)
    })
    .await
}

/// POST /api/proposals/{hash}/execute - Submit a proposal to the Safe
pub async fn execute_proposal(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
    Json(req): Json<ExecuteRequest>,
) -> ApiResult<ExecutionOutcome> {
    let hash = parse_hash(&hash)?;
    write_coordinator(&state, move |coordinator| {
        coordinator.execute(&hash, req.executor).map_err(api_error)
    })
    .await
}
