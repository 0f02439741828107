//! Transaction relaying and cross-shard lookup.
//!
//! Sends go to the sender's shard with eager propagation of backend
//! rejections: once an observer gives a definitive non-skip answer to a
//! signed transaction, retrying the same bytes elsewhere cannot change it.
//! Lookups walk every shard and merge the source and destination views of
//! cross-shard transactions into one canonical result.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use num_bigint::BigInt;
use serde_json::Value;
use shardgate_data::{
    ApiResponse, ApiSmartContractResult, ApiTransactionResult, GenericApiResponse,
    GetTransactionData, MultipleTransactionsData, NodeData, PoolForSenderData, PoolLastNonceData,
    PoolNonceGapsData, ShardId, Transaction, TransactionsPool, TransactionsPoolForSender,
    TransactionsPoolNonceGaps, TxCostData, TxHashData, TxPoolData, METACHAIN_SHARD_ID,
};
use tracing::{debug, info, warn};

use crate::errors::{ProcessError, SimulationSide};
use crate::ports::{
    CallOutcome, Hasher, LogsMerger, Marshalizer, Processor, PubkeyConverter,
    TxCostHandlerFactory,
};

/// Transaction group path prefix on the observers.
pub const TRANSACTION_PATH: &str = "/transaction/";
/// Single transaction send path.
pub const TRANSACTION_SEND_PATH: &str = "/transaction/send";
/// Transaction simulation path.
pub const TRANSACTION_SIMULATE_PATH: &str = "/transaction/simulate";
/// Batched transaction send path.
pub const MULTIPLE_TRANSACTIONS_PATH: &str = "/transaction/send-multiple";
/// Transaction pool path.
pub const TRANSACTIONS_POOL_PATH: &str = "/transaction/pool";
/// Status reported when no observer knows the transaction.
pub const UNKNOWN_STATUS: &str = "unknown";

const WITH_RESULTS_PARAM: &str = "?withResults=true";
const CHECK_SIGNATURE_FALSE: &str = "?checkSignature=false";
const FIELDS_PARAM: &str = "?fields=";
const BY_SENDER_PARAM: &str = "&by-sender=";
const LAST_NONCE_PARAM: &str = "?last-nonce=true";
const NONCE_GAPS_PARAM: &str = "?nonce-gaps=true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestType {
    Observers,
    FullHistoryNodes,
}

/// Result of asking one observer for one transaction.
enum TxFetch {
    /// 200 with a decoded transaction.
    Found(GetTransactionData),
    /// A clean non-200 answer; the shard does not know the hash.
    NotFound,
    /// The observer could not be reached or answered garbage.
    TransportError,
}

/// Transaction operations of the proxy.
pub struct TransactionProcessor {
    proc: Arc<dyn Processor>,
    pubkey_converter: Arc<dyn PubkeyConverter>,
    hasher: Arc<dyn Hasher>,
    marshalizer: Arc<dyn Marshalizer>,
    new_tx_cost_handler: TxCostHandlerFactory,
    logs_merger: Arc<dyn LogsMerger>,
    allow_entire_pool_fetch: bool,
}

impl TransactionProcessor {
    /// Wire the processor with its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        proc: Arc<dyn Processor>,
        pubkey_converter: Arc<dyn PubkeyConverter>,
        hasher: Arc<dyn Hasher>,
        marshalizer: Arc<dyn Marshalizer>,
        new_tx_cost_handler: TxCostHandlerFactory,
        logs_merger: Arc<dyn LogsMerger>,
        allow_entire_pool_fetch: bool,
    ) -> Self {
        Self {
            proc,
            pubkey_converter,
            hasher,
            marshalizer,
            new_tx_cost_handler,
            logs_merger,
            allow_entire_pool_fetch,
        }
    }

    /// Relay a signed transaction to its sender shard and return the hash
    /// assigned by the accepting observer.
    pub async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProcessError> {
        self.check_transaction_fields(tx)?;

        let sender = self.pubkey_converter.decode(&tx.sender)?;
        let shard_id = self.proc.compute_shard_id(&sender)?;
        let observers = self.proc.observers(shard_id)?;
        let body = to_json(tx)?;

        for observer in &observers {
            match self
                .proc
                .call_post(&observer.address, TRANSACTION_SEND_PATH, &body)
                .await
            {
                CallOutcome::Ok(value) => {
                    let response: ApiResponse<TxHashData> = match serde_json::from_value(value) {
                        Ok(response) => response,
                        Err(e) => {
                            warn!(observer = %observer.address, error = %e, "malformed send response");
                            continue;
                        }
                    };
                    info!(
                        observer = %observer.address,
                        shard = shard_id,
                        tx_hash = %response.data.tx_hash,
                        "transaction sent"
                    );
                    return Ok(response.data.tx_hash);
                }
                CallOutcome::Skip { reason, .. } => {
                    warn!(observer = %observer.address, reason, "skipping observer for send");
                }
                // A definitive rejection is relayed to the client as-is.
                CallOutcome::Reject { status, body } => {
                    return Err(ProcessError::ObserverRejected { status, body });
                }
            }
        }

        Err(ProcessError::SendingRequest)
    }

    /// Simulate a transaction on its sender shard and, for cross-shard
    /// transfers, on the receiver shard as well.
    pub async fn simulate_transaction(
        &self,
        tx: &Transaction,
        check_signature: bool,
    ) -> Result<GenericApiResponse, ProcessError> {
        self.check_transaction_fields(tx)?;

        let sender = self.pubkey_converter.decode(&tx.sender)?;
        let sender_shard = self.proc.compute_shard_id(&sender)?;
        let observers = self.proc.observers(sender_shard)?;
        let sender_response = self
            .simulate_on(&observers, tx, check_signature)
            .await
            .map_err(|e| ProcessError::Simulation {
                side: SimulationSide::Sender,
                shard: sender_shard,
                cause: Box::new(e),
            })?;

        let receiver = self.pubkey_converter.decode(&tx.receiver)?;
        let receiver_shard = self.proc.compute_shard_id(&receiver)?;
        if sender_shard == receiver_shard {
            return Ok(sender_response);
        }

        let receiver_observers = self.proc.observers(receiver_shard)?;
        let receiver_response = self
            .simulate_on(&receiver_observers, tx, check_signature)
            .await
            .map_err(|e| ProcessError::Simulation {
                side: SimulationSide::Receiver,
                shard: receiver_shard,
                cause: Box::new(e),
            })?;

        let combined = serde_json::json!({
            "result": {
                "senderShard": sender_response.data["result"],
                "receiverShard": receiver_response.data["result"],
            }
        });
        Ok(GenericApiResponse::ok(combined))
    }

    async fn simulate_on(
        &self,
        observers: &[NodeData],
        tx: &Transaction,
        check_signature: bool,
    ) -> Result<GenericApiResponse, ProcessError> {
        let mut path = TRANSACTION_SIMULATE_PATH.to_string();
        if !check_signature {
            path.push_str(CHECK_SIGNATURE_FALSE);
        }
        let body = to_json(tx)?;

        for observer in observers {
            match self.proc.call_post(&observer.address, &path, &body).await {
                CallOutcome::Ok(value) => {
                    let response: GenericApiResponse = serde_json::from_value(value)
                        .unwrap_or_else(|_| GenericApiResponse::ok(Value::Null));
                    info!(
                        observer = %observer.address,
                        shard = observer.shard_id,
                        "transaction simulated"
                    );
                    return Ok(response);
                }
                CallOutcome::Skip { reason, .. } => {
                    warn!(observer = %observer.address, reason, "skipping observer for simulation");
                }
                CallOutcome::Reject { status, body } => {
                    return Err(ProcessError::ObserverRejected { status, body });
                }
            }
        }

        Err(ProcessError::SendingRequest)
    }

    /// Relay a batch of transactions, grouped by sender shard.
    ///
    /// Invalid transactions are dropped with a warning; surviving ones keep
    /// their submission position as the key of the returned hash map.
    pub async fn send_multiple_transactions(
        &self,
        txs: &[Transaction],
    ) -> Result<MultipleTransactionsData, ProcessError> {
        let mut txs_to_send: Vec<Transaction> = Vec::new();
        for (position, tx) in txs.iter().enumerate() {
            if let Err(e) = self.check_transaction_fields(tx) {
                warn!(
                    sender = %tx.sender,
                    receiver = %tx.receiver,
                    error = %e,
                    "invalid tx received"
                );
                continue;
            }
            let mut tx = tx.clone();
            tx.index = position;
            txs_to_send.push(tx);
        }
        if txs_to_send.is_empty() {
            return Err(ProcessError::NoValidTransactionToSend);
        }

        let mut total_sent: u64 = 0;
        let mut hashes: HashMap<usize, String> = HashMap::new();

        for (shard_id, group) in self.group_txs_by_shard(txs_to_send) {
            let observers = self
                .proc
                .observers(shard_id)
                .map_err(|_| ProcessError::MissingObserver)?;
            let body = to_json(&group)?;

            for observer in &observers {
                match self
                    .proc
                    .call_post(&observer.address, MULTIPLE_TRANSACTIONS_PATH, &body)
                    .await
                {
                    CallOutcome::Ok(value) => {
                        let response: ApiResponse<MultipleTransactionsData> =
                            match serde_json::from_value(value) {
                                Ok(response) => response,
                                Err(e) => {
                                    warn!(observer = %observer.address, error = %e, "malformed batch response");
                                    continue;
                                }
                            };
                        info!(
                            observer = %observer.address,
                            shard = shard_id,
                            total_processed = response.data.num_of_txs,
                            "transactions sent"
                        );
                        total_sent += response.data.num_of_txs;
                        for (local_index, hash) in response.data.txs_hashes {
                            if let Some(tx) = group.get(local_index) {
                                hashes.insert(tx.index, hash);
                            }
                        }
                        break;
                    }
                    CallOutcome::Skip { reason, .. } => {
                        warn!(observer = %observer.address, reason, "skipping observer for batch send");
                    }
                    CallOutcome::Reject { status, .. } => {
                        warn!(observer = %observer.address, %status, "observer rejected batch");
                    }
                }
            }
        }

        Ok(MultipleTransactionsData {
            num_of_txs: total_sent,
            txs_hashes: hashes,
        })
    }

    /// Estimate the gas cost of a transaction through a fresh handler.
    pub async fn transaction_cost_request(
        &self,
        tx: &Transaction,
    ) -> Result<TxCostData, ProcessError> {
        self.check_transaction_fields(tx)?;

        let handler = (self.new_tx_cost_handler)()?;
        handler.resolve_cost_request(tx).await
    }

    /// Fetch a transaction by hash, searching every shard.
    pub async fn get_transaction(
        &self,
        tx_hash: &str,
        with_results: bool,
    ) -> Result<ApiTransactionResult, ProcessError> {
        let request_type = if with_results {
            RequestType::FullHistoryNodes
        } else {
            RequestType::Observers
        };
        let tx = self
            .get_tx_from_observers(tx_hash, request_type, with_results)
            .await?;
        Ok(promote_notarization_fields(tx))
    }

    /// Fetch a transaction by hash when the sender is known, skipping the
    /// shard search.
    pub async fn get_transaction_by_hash_and_sender_address(
        &self,
        tx_hash: &str,
        sender: &str,
        with_events: bool,
    ) -> Result<ApiTransactionResult, ProcessError> {
        let tx = self.get_tx_with_sender_addr(tx_hash, sender, with_events).await?;
        Ok(promote_notarization_fields(tx))
    }

    /// Status of a transaction, `"unknown"` when no observer knows it.
    pub async fn get_transaction_status(
        &self,
        tx_hash: &str,
        sender: &str,
    ) -> Result<String, ProcessError> {
        if !sender.is_empty() {
            let tx = self.get_tx_with_sender_addr(tx_hash, sender, false).await?;
            return Ok(tx.status);
        }

        let tx = self
            .get_tx_from_observers(tx_hash, RequestType::Observers, false)
            .await
            .map_err(|_| ProcessError::TransactionNotFound)?;
        Ok(tx.status)
    }

    /// Deterministic canonical hash of a transaction.
    pub fn compute_transaction_hash(&self, tx: &Transaction) -> Result<String, ProcessError> {
        let value = BigInt::parse_bytes(tx.value.as_bytes(), 10)
            .ok_or(ProcessError::InvalidTransactionValueField)?;
        let receiver = self
            .pubkey_converter
            .decode(&tx.receiver)
            .map_err(|_| ProcessError::InvalidAddress)?;
        let sender = self
            .pubkey_converter
            .decode(&tx.sender)
            .map_err(|_| ProcessError::InvalidAddress)?;
        let signature =
            hex::decode(&tx.signature).map_err(|_| ProcessError::InvalidSignatureBytes)?;

        let canonical = serde_json::json!({
            "nonce": tx.nonce,
            "value": value.to_string(),
            "receiver": hex::encode(&receiver),
            "sender": hex::encode(&sender),
            "gasPrice": tx.gas_price,
            "gasLimit": tx.gas_limit,
            "data": tx.data,
            "chainID": tx.chain_id,
            "version": tx.version,
            "signature": hex::encode(&signature),
        });

        let bytes = self.marshalizer.marshal(&canonical)?;
        let digest = self.hasher.compute(&bytes);
        if digest.is_empty() {
            return Err(ProcessError::ComputeTransactionHash(
                "hasher produced an empty digest".to_string(),
            ));
        }
        Ok(hex::encode(digest))
    }

    /// Cluster-wide pool view. Gated by configuration.
    pub async fn get_transactions_pool(
        &self,
        fields: &str,
    ) -> Result<TransactionsPool, ProcessError> {
        if !self.allow_entire_pool_fetch {
            return Err(ProcessError::OperationNotAllowed);
        }

        let mut pool = TransactionsPool::default();
        for shard_id in self.proc.shard_ids() {
            match self.get_tx_pool_for_shard(shard_id, fields).await {
                Ok(shard_pool) => {
                    pool.regular_transactions.extend(shard_pool.regular_transactions);
                    pool.rewards.extend(shard_pool.rewards);
                    pool.smart_contract_results
                        .extend(shard_pool.smart_contract_results);
                }
                Err(e) => {
                    debug!(shard = shard_id, error = %e, "cannot get tx pool for shard");
                    pool.dropped_shards.push(shard_id);
                }
            }
        }

        Ok(pool)
    }

    /// Pool view of one shard. Gated by configuration.
    pub async fn get_transactions_pool_for_shard(
        &self,
        shard_id: ShardId,
        fields: &str,
    ) -> Result<TransactionsPool, ProcessError> {
        if !self.allow_entire_pool_fetch {
            return Err(ProcessError::OperationNotAllowed);
        }

        self.get_tx_pool_for_shard(shard_id, fields).await
    }

    /// Pooled transactions of one sender.
    pub async fn get_transactions_pool_for_sender(
        &self,
        sender: &str,
        fields: &str,
    ) -> Result<TransactionsPoolForSender, ProcessError> {
        let (observers, _) = self
            .shard_observers_for_sender(sender, RequestType::Observers)?;

        let path = format!("{TRANSACTIONS_POOL_PATH}{FIELDS_PARAM}{fields}{BY_SENDER_PARAM}{sender}");
        for observer in &observers {
            if let CallOutcome::Ok(value) = self.proc.call_get(&observer.address, &path).await {
                if let Ok(response) =
                    serde_json::from_value::<ApiResponse<PoolForSenderData>>(value)
                {
                    return Ok(response.data.tx_pool);
                }
            }
        }

        // An empty view rather than an error when every observer failed.
        Ok(TransactionsPoolForSender::default())
    }

    /// Highest pooled nonce of one sender.
    pub async fn get_last_pool_nonce_for_sender(
        &self,
        sender: &str,
    ) -> Result<u64, ProcessError> {
        let (observers, _) = self
            .shard_observers_for_sender(sender, RequestType::Observers)?;

        let path = format!("{TRANSACTIONS_POOL_PATH}{LAST_NONCE_PARAM}{BY_SENDER_PARAM}{sender}");
        for observer in &observers {
            if let CallOutcome::Ok(value) = self.proc.call_get(&observer.address, &path).await {
                if let Ok(response) =
                    serde_json::from_value::<ApiResponse<PoolLastNonceData>>(value)
                {
                    return Ok(response.data.nonce);
                }
            }
        }

        Err(ProcessError::TransactionsNotFoundInPool)
    }

    /// Nonce gaps of one sender's pooled transactions.
    pub async fn get_transactions_pool_nonce_gaps_for_sender(
        &self,
        sender: &str,
    ) -> Result<TransactionsPoolNonceGaps, ProcessError> {
        let (observers, _) = self
            .shard_observers_for_sender(sender, RequestType::Observers)?;

        let path = format!("{TRANSACTIONS_POOL_PATH}{NONCE_GAPS_PARAM}{BY_SENDER_PARAM}{sender}");
        for observer in &observers {
            if let CallOutcome::Ok(value) = self.proc.call_get(&observer.address, &path).await {
                if let Ok(response) =
                    serde_json::from_value::<ApiResponse<PoolNonceGapsData>>(value)
                {
                    return Ok(response.data.nonce_gaps);
                }
            }
        }

        Ok(TransactionsPoolNonceGaps::default())
    }

    fn check_transaction_fields(&self, tx: &Transaction) -> Result<(), ProcessError> {
        if let Err(e) = self.pubkey_converter.decode(&tx.sender) {
            return Err(ProcessError::InvalidTxFields {
                message: ProcessError::InvalidSenderAddress.to_string(),
                reason: e.to_string(),
            });
        }
        if let Err(e) = self.pubkey_converter.decode(&tx.receiver) {
            return Err(ProcessError::InvalidTxFields {
                message: ProcessError::InvalidReceiverAddress.to_string(),
                reason: e.to_string(),
            });
        }
        if tx.chain_id.is_empty() {
            return Err(ProcessError::InvalidTxFields {
                message: "transaction must contain chainID".to_string(),
                reason: "no chainID".to_string(),
            });
        }
        if tx.version == 0 {
            return Err(ProcessError::InvalidTxFields {
                message: "transaction must contain version".to_string(),
                reason: "no version".to_string(),
            });
        }
        if let Err(e) = hex::decode(&tx.signature) {
            return Err(ProcessError::InvalidTxFields {
                message: ProcessError::InvalidSignatureHex.to_string(),
                reason: e.to_string(),
            });
        }

        Ok(())
    }

    fn group_txs_by_shard(&self, txs: Vec<Transaction>) -> BTreeMap<ShardId, Vec<Transaction>> {
        let mut groups: BTreeMap<ShardId, Vec<Transaction>> = BTreeMap::new();
        for tx in txs {
            let sender = match self.pubkey_converter.decode(&tx.sender) {
                Ok(sender) => sender,
                Err(_) => continue,
            };
            let shard_id = match self.proc.compute_shard_id(&sender) {
                Ok(shard_id) => shard_id,
                Err(_) => continue,
            };
            groups.entry(shard_id).or_default().push(tx);
        }
        groups
    }

    async fn get_tx_from_observers(
        &self,
        tx_hash: &str,
        request_type: RequestType,
        with_results: bool,
    ) -> Result<ApiTransactionResult, ProcessError> {
        for observer_shard in self.proc.shard_ids() {
            let nodes = self.nodes_in_shard(observer_shard, request_type)?;

            let mut found = None;
            for node in &nodes {
                match self.get_tx_from_observer(node, tx_hash, with_results).await {
                    TxFetch::Found(data) => {
                        found = Some(data);
                        break;
                    }
                    // A clean miss: no node of this shard will know better.
                    TxFetch::NotFound => break,
                    TxFetch::TransportError => continue,
                }
            }
            let Some(data) = found else { continue };
            let tx = data.transaction;

            let source_shard = self.shard_by_address_tolerant(&tx.sender);
            let destination_shard = self.shard_by_address_tolerant(&tx.receiver);

            if source_shard == destination_shard {
                return Ok(tx);
            }

            if destination_shard == observer_shard {
                return Ok(self
                    .alter_tx_with_scrs_from_source(tx_hash, tx, with_results)
                    .await);
            }

            if let Some(dest_tx) = self
                .get_tx_from_dest_shard(tx_hash, destination_shard, with_results)
                .await
            {
                return Ok(self.merge_scrs(tx, dest_tx, with_results));
            }

            // No destination-shard answer; the source view is still useful.
            return Ok(tx);
        }

        Err(ProcessError::TransactionNotFound)
    }

    /// The answering observer sits in the destination shard; when results
    /// are requested the source-shard SCRs still have to be folded in.
    async fn alter_tx_with_scrs_from_source(
        &self,
        tx_hash: &str,
        tx: ApiTransactionResult,
        with_results: bool,
    ) -> ApiTransactionResult {
        if !with_results || tx.smart_contract_results.is_empty() {
            return tx;
        }

        let Ok(nodes) = self.nodes_in_shard(tx.source_shard, RequestType::FullHistoryNodes) else {
            return tx;
        };

        for node in &nodes {
            if let TxFetch::Found(data) = self.get_tx_from_observer(node, tx_hash, with_results).await
            {
                return self.merge_scrs(data.transaction, tx, with_results);
            }
        }

        tx
    }

    async fn get_tx_with_sender_addr(
        &self,
        tx_hash: &str,
        sender: &str,
        with_events: bool,
    ) -> Result<ApiTransactionResult, ProcessError> {
        let (observers, sender_shard) =
            self.shard_observers_for_sender(sender, RequestType::FullHistoryNodes)?;

        for observer in &observers {
            let TxFetch::Found(data) =
                self.get_tx_from_observer(observer, tx_hash, with_events).await
            else {
                continue;
            };
            let tx = data.transaction;

            let destination_shard = self.shard_by_address_tolerant(&tx.receiver);
            if destination_shard == sender_shard {
                return Ok(tx);
            }

            if let Some(dest_tx) = self
                .get_tx_from_dest_shard(tx_hash, destination_shard, with_events)
                .await
            {
                return Ok(self.merge_scrs(tx, dest_tx, with_events));
            }

            return Ok(tx);
        }

        Err(ProcessError::TransactionNotFound)
    }

    /// Union of the source and destination SCR lists, keyed by hash. The
    /// destination copy of a duplicated SCR survives, carrying the merged
    /// logs of both sides.
    fn merge_scrs(
        &self,
        source_tx: ApiTransactionResult,
        mut dest_tx: ApiTransactionResult,
        with_events: bool,
    ) -> ApiTransactionResult {
        if !with_events {
            return dest_tx;
        }

        let combined: Vec<ApiSmartContractResult> = source_tx
            .smart_contract_results
            .into_iter()
            .chain(std::mem::take(&mut dest_tx.smart_contract_results))
            .collect();

        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<ApiSmartContractResult> = Vec::new();
        for scr in combined {
            match slots.get(&scr.hash) {
                None => {
                    slots.insert(scr.hash.clone(), merged.len());
                    merged.push(scr);
                }
                Some(&slot) => {
                    let logs = self
                        .logs_merger
                        .merge_log_events(merged[slot].logs.as_ref(), scr.logs.as_ref());
                    let mut replacement = scr;
                    replacement.logs = logs;
                    merged[slot] = replacement;
                }
            }
        }

        dest_tx.smart_contract_results = merged;
        dest_tx
    }

    async fn get_tx_from_observer(
        &self,
        observer: &NodeData,
        tx_hash: &str,
        with_results: bool,
    ) -> TxFetch {
        let mut path = format!("{TRANSACTION_PATH}{tx_hash}");
        if with_results {
            path.push_str(WITH_RESULTS_PARAM);
        }

        match self.proc.call_get(&observer.address, &path).await {
            CallOutcome::Ok(value) => {
                match serde_json::from_value::<ApiResponse<GetTransactionData>>(value) {
                    Ok(response) => TxFetch::Found(response.data),
                    Err(e) => {
                        debug!(observer = %observer.address, error = %e, "malformed transaction body");
                        TxFetch::TransportError
                    }
                }
            }
            CallOutcome::Skip { status: None, reason } => {
                debug!(observer = %observer.address, tx_hash, reason, "cannot get transaction");
                TxFetch::TransportError
            }
            CallOutcome::Skip { status: Some(status), .. } => {
                if status == http::StatusCode::TOO_MANY_REQUESTS {
                    warn!(observer = %observer.address, tx_hash, "rate limited while getting transaction");
                }
                TxFetch::NotFound
            }
            CallOutcome::Reject { .. } => TxFetch::NotFound,
        }
    }

    async fn get_tx_from_dest_shard(
        &self,
        tx_hash: &str,
        shard_id: ShardId,
        with_events: bool,
    ) -> Option<ApiTransactionResult> {
        let observers = self.proc.observers(shard_id).ok()?;

        for observer in &observers {
            if let TxFetch::Found(data) =
                self.get_tx_from_observer(observer, tx_hash, with_events).await
            {
                return Some(data.transaction);
            }
        }

        None
    }

    fn shard_observers_for_sender(
        &self,
        sender: &str,
        request_type: RequestType,
    ) -> Result<(Vec<NodeData>, ShardId), ProcessError> {
        let shard_id = self
            .shard_by_address(sender)
            .map_err(|_| ProcessError::InvalidSenderAddress)?;
        let observers = self.nodes_in_shard(shard_id, request_type)?;
        Ok((observers, shard_id))
    }

    fn shard_by_address(&self, address: &str) -> Result<ShardId, ProcessError> {
        if address == METACHAIN_SHARD_ID.to_string() {
            return Ok(METACHAIN_SHARD_ID);
        }
        let bytes = self.pubkey_converter.decode(address)?;
        self.proc.compute_shard_id(&bytes)
    }

    /// Shard of an address coming back from an observer. Decode failures on
    /// backend data are logged and tolerated.
    fn shard_by_address_tolerant(&self, address: &str) -> ShardId {
        match self.shard_by_address(address) {
            Ok(shard_id) => shard_id,
            Err(e) => {
                warn!(address, error = %e, "cannot compute shard for address");
                0
            }
        }
    }

    fn nodes_in_shard(
        &self,
        shard_id: ShardId,
        request_type: RequestType,
    ) -> Result<Vec<NodeData>, ProcessError> {
        if request_type == RequestType::FullHistoryNodes {
            if let Ok(nodes) = self.proc.full_history_nodes(shard_id) {
                if !nodes.is_empty() {
                    return Ok(nodes);
                }
            }
        }

        self.proc.observers(shard_id)
    }

    async fn get_tx_pool_for_shard(
        &self,
        shard_id: ShardId,
        fields: &str,
    ) -> Result<TransactionsPool, ProcessError> {
        let observers = self.nodes_in_shard(shard_id, RequestType::Observers)?;

        let path = format!("{TRANSACTIONS_POOL_PATH}{FIELDS_PARAM}{fields}");
        for observer in &observers {
            if let CallOutcome::Ok(value) = self.proc.call_get(&observer.address, &path).await {
                if let Ok(response) = serde_json::from_value::<ApiResponse<TxPoolData>>(value) {
                    return Ok(response.data.tx_pool);
                }
            }
        }

        Err(ProcessError::TransactionsNotFoundInPool)
    }
}

fn promote_notarization_fields(mut tx: ApiTransactionResult) -> ApiTransactionResult {
    tx.hyperblock_nonce = tx.notarized_at_destination_in_meta_nonce;
    tx.hyperblock_hash = tx.notarized_at_destination_in_meta_hash.clone();
    tx
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ProcessError> {
    serde_json::to_value(value).map_err(|e| ProcessError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{JsonMarshalizer, Keccak256Hasher};
    use crate::ports::TransactionCostHandler;
    use crate::testing::{MockLogsMerger, MockProcessor, MockPubkeyConverter, MockTxCostHandler};
    use http::StatusCode;
    use parking_lot::Mutex;
    use serde_json::json;
    use shardgate_data::ApiLogs;

    fn addr(byte: u8) -> String {
        hex::encode([byte; 32])
    }

    fn valid_tx(sender_byte: u8, receiver_byte: u8) -> Transaction {
        Transaction {
            nonce: 1,
            value: "10".to_string(),
            receiver: addr(receiver_byte),
            sender: addr(sender_byte),
            gas_price: 1_000_000_000,
            gas_limit: 50_000,
            data: None,
            signature: "aa".repeat(64),
            chain_id: "1".to_string(),
            version: 1,
            index: 0,
        }
    }

    fn envelope(data: Value) -> CallOutcome {
        CallOutcome::Ok(json!({"data": data, "error": "", "code": "successful"}))
    }

    fn tx_envelope(tx: &ApiTransactionResult) -> CallOutcome {
        envelope(json!({"transaction": serde_json::to_value(tx).unwrap()}))
    }

    fn skip(status: StatusCode) -> CallOutcome {
        CallOutcome::Skip {
            status: Some(status),
            reason: format!("observer replied {status}"),
        }
    }

    /// Shard by first address byte: 0xAA lives in shard 0, 0xBB in shard 1.
    fn shard_of_first_byte() -> Box<dyn Fn(&[u8]) -> Result<ShardId, ProcessError> + Send + Sync>
    {
        Box::new(|address| Ok(if address[0] == 0xAA { 0 } else { 1 }))
    }

    fn tx_processor_with(proc: MockProcessor, merger: MockLogsMerger) -> TransactionProcessor {
        TransactionProcessor::new(
            Arc::new(proc),
            Arc::new(MockPubkeyConverter::default()),
            Arc::new(Keccak256Hasher),
            Arc::new(JsonMarshalizer),
            Arc::new(|| {
                Ok(Box::new(MockTxCostHandler::default()) as Box<dyn TransactionCostHandler>)
            }),
            Arc::new(merger),
            true,
        )
    }

    fn tx_processor(proc: MockProcessor) -> TransactionProcessor {
        tx_processor_with(proc, MockLogsMerger::default())
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_sender() {
        let processor = tx_processor(MockProcessor::default());
        let mut tx = valid_tx(0xAA, 0xBB);
        tx.sender = "not-hex".to_string();

        let err = processor.send_transaction(&tx).await.unwrap_err();
        match err {
            ProcessError::InvalidTxFields { message, .. } => {
                assert_eq!(message, "invalid sender address");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_receiver() {
        let processor = tx_processor(MockProcessor::default());
        let mut tx = valid_tx(0xAA, 0xBB);
        tx.receiver = "not-hex".to_string();

        let err = processor.send_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, ProcessError::InvalidTxFields { message, .. }
            if message == "invalid receiver address"));
    }

    #[tokio::test]
    async fn test_send_rejects_missing_chain_id_and_version() {
        let processor = tx_processor(MockProcessor::default());

        let mut tx = valid_tx(0xAA, 0xBB);
        tx.chain_id = String::new();
        assert!(matches!(
            processor.send_transaction(&tx).await.unwrap_err(),
            ProcessError::InvalidTxFields { reason, .. } if reason == "no chainID"
        ));

        let mut tx = valid_tx(0xAA, 0xBB);
        tx.version = 0;
        assert!(matches!(
            processor.send_transaction(&tx).await.unwrap_err(),
            ProcessError::InvalidTxFields { reason, .. } if reason == "no version"
        ));
    }

    #[tokio::test]
    async fn test_send_rejects_bad_signature_hex() {
        let processor = tx_processor(MockProcessor::default());
        let mut tx = valid_tx(0xAA, 0xBB);
        tx.signature = "zz".to_string();

        let err = processor.send_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, ProcessError::InvalidTxFields { message, .. }
            if message == "invalid signature hex"));
    }

    #[tokio::test]
    async fn test_send_returns_backend_hash() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                assert_eq!(shard, 0);
                Ok(vec![NodeData::new("http://obs-0", shard)])
            })),
            call_post_fn: Some(Box::new(|_, path, _| {
                assert_eq!(path, TRANSACTION_SEND_PATH);
                envelope(json!({"txHash": "deadbeef"}))
            })),
            ..MockProcessor::default()
        };

        let hash = tx_processor(proc)
            .send_transaction(&valid_tx(0xAA, 0xBB))
            .await
            .unwrap();
        assert_eq!(hash, "deadbeef");
    }

    #[tokio::test]
    async fn test_send_propagates_first_rejection_eagerly() {
        let contacted = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = Arc::clone(&contacted);

        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![
                    NodeData::new("http://obs-timeout", shard),
                    NodeData::new("http://obs-reject", shard),
                    NodeData::new("http://obs-fine", shard),
                ])
            })),
            call_post_fn: Some(Box::new(move |observer, _, _| {
                seen.lock().push(observer.to_string());
                match observer {
                    "http://obs-timeout" => skip(StatusCode::REQUEST_TIMEOUT),
                    "http://obs-reject" => CallOutcome::Reject {
                        status: StatusCode::BAD_REQUEST,
                        body: GenericApiResponse::err(
                            "bad nonce",
                            shardgate_data::ReturnCode::RequestError,
                        ),
                    },
                    _ => envelope(json!({"txHash": "deadbeef"})),
                }
            })),
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .send_transaction(&valid_tx(0xAA, 0xBB))
            .await
            .unwrap_err();

        match err {
            ProcessError::ObserverRejected { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body.error, "bad nonce");
            }
            other => panic!("unexpected error {other:?}"),
        }
        // The healthy third observer is never asked.
        assert_eq!(
            *contacted.lock(),
            vec!["http://obs-timeout", "http://obs-reject"]
        );
    }

    #[tokio::test]
    async fn test_send_exhaustion_is_sending_request() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![
                    NodeData::new("http://obs-a", shard),
                    NodeData::new("http://obs-b", shard),
                ])
            })),
            call_post_fn: Some(Box::new(|_, _, _| skip(StatusCode::NOT_FOUND))),
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .send_transaction(&valid_tx(0xAA, 0xBB))
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::SendingRequest);
    }

    #[tokio::test]
    async fn test_send_multiple_groups_by_shard_and_keeps_positions() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_post_fn: Some(Box::new(|observer, path, body| {
                assert_eq!(path, MULTIPLE_TRANSACTIONS_PATH);
                let group = body.as_array().expect("batch body is an array");
                let shard = observer.trim_start_matches("http://obs-");
                let hashes: serde_json::Map<String, Value> = group
                    .iter()
                    .enumerate()
                    .map(|(i, _)| (i.to_string(), json!(format!("hash-{shard}-{i}"))))
                    .collect();
                envelope(json!({"numOfTxs": group.len(), "txsHashes": hashes}))
            })),
            ..MockProcessor::default()
        };

        let mut invalid = valid_tx(0xAA, 0xBB);
        invalid.chain_id = String::new();
        let txs = vec![
            valid_tx(0xAA, 0xBB), // position 0, shard 0
            valid_tx(0xBB, 0xAA), // position 1, shard 1
            invalid,              // position 2, dropped
            valid_tx(0xAA, 0xAA), // position 3, shard 0
        ];

        let result = tx_processor(proc)
            .send_multiple_transactions(&txs)
            .await
            .unwrap();

        assert_eq!(result.num_of_txs, 3);
        assert_eq!(result.txs_hashes[&0], "hash-0-0");
        assert_eq!(result.txs_hashes[&3], "hash-0-1");
        assert_eq!(result.txs_hashes[&1], "hash-1-0");
        assert!(!result.txs_hashes.contains_key(&2));
    }

    #[tokio::test]
    async fn test_send_multiple_all_invalid() {
        let mut tx = valid_tx(0xAA, 0xBB);
        tx.version = 0;

        let err = tx_processor(MockProcessor::default())
            .send_multiple_transactions(&[tx])
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::NoValidTransactionToSend);
    }

    #[tokio::test]
    async fn test_send_multiple_missing_observers() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            // observers_fn left unset: every lookup fails
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .send_multiple_transactions(&[valid_tx(0xAA, 0xBB)])
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::MissingObserver);
    }

    #[tokio::test]
    async fn test_simulate_intra_shard_returns_sender_leg() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_post_fn: Some(Box::new(|_, path, _| {
                assert_eq!(path, TRANSACTION_SIMULATE_PATH);
                envelope(json!({"result": {"status": "success", "hash": "aa"}}))
            })),
            ..MockProcessor::default()
        };

        // Both accounts in shard 0.
        let response = tx_processor(proc)
            .simulate_transaction(&valid_tx(0xAA, 0xAA), true)
            .await
            .unwrap();
        assert_eq!(response.data["result"]["status"], "success");
    }

    #[tokio::test]
    async fn test_simulate_cross_shard_combines_both_legs() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_post_fn: Some(Box::new(|observer, path, _| {
                // The signature check is disabled, so the flag rides along.
                assert!(path.ends_with(CHECK_SIGNATURE_FALSE));
                if observer == "http://obs-0" {
                    envelope(json!({"result": {"status": "success", "leg": "sender"}}))
                } else {
                    envelope(json!({"result": {"status": "success", "leg": "receiver"}}))
                }
            })),
            ..MockProcessor::default()
        };

        let response = tx_processor(proc)
            .simulate_transaction(&valid_tx(0xAA, 0xBB), false)
            .await
            .unwrap();
        assert_eq!(response.data["result"]["senderShard"]["leg"], "sender");
        assert_eq!(response.data["result"]["receiverShard"]["leg"], "receiver");
    }

    #[tokio::test]
    async fn test_simulate_wraps_failing_side() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_post_fn: Some(Box::new(|_, _, _| skip(StatusCode::NOT_FOUND))),
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .simulate_transaction(&valid_tx(0xAA, 0xBB), true)
            .await
            .unwrap_err();
        match err {
            ProcessError::Simulation { side, shard, cause } => {
                assert_eq!(side, SimulationSide::Sender);
                assert_eq!(shard, 0);
                assert_eq!(*cause, ProcessError::SendingRequest);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_transaction_intra_shard_promotes_notarization() {
        let returned = ApiTransactionResult {
            hash: "cafe".to_string(),
            status: "success".to_string(),
            sender: addr(0xAA),
            receiver: addr(0xAA),
            source_shard: 0,
            destination_shard: 0,
            notarized_at_destination_in_meta_nonce: 55,
            notarized_at_destination_in_meta_hash: "beef".to_string(),
            ..ApiTransactionResult::default()
        };
        let response = tx_envelope(&returned);

        let proc = MockProcessor {
            shard_ids_fn: Some(Box::new(|| vec![0])),
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs-0", shard)])
            })),
            call_get_fn: Some(Box::new(move |_, _| response.clone())),
            ..MockProcessor::default()
        };

        let tx = tx_processor(proc).get_transaction("cafe", false).await.unwrap();
        assert_eq!(tx.hyperblock_nonce, 55);
        assert_eq!(tx.hyperblock_hash, "beef");
        assert_eq!(tx.status, "success");
    }

    fn logs(tag: &str) -> ApiLogs {
        ApiLogs {
            address: tag.to_string(),
            events: Vec::new(),
        }
    }

    fn scr(hash: &str, logs_tag: &str) -> ApiSmartContractResult {
        ApiSmartContractResult {
            hash: hash.to_string(),
            logs: Some(logs(logs_tag)),
            ..ApiSmartContractResult::default()
        }
    }

    #[tokio::test]
    async fn test_get_transaction_merges_cross_shard_scrs() {
        let source_view = ApiTransactionResult {
            hash: "cafe".to_string(),
            status: "pending".to_string(),
            sender: addr(0xAA),
            receiver: addr(0xBB),
            source_shard: 0,
            destination_shard: 1,
            smart_contract_results: vec![scr("A", "L1"), scr("B", "L2")],
            ..ApiTransactionResult::default()
        };
        let dest_view = ApiTransactionResult {
            status: "success".to_string(),
            smart_contract_results: vec![scr("A", "L3"), scr("C", "L4")],
            ..source_view.clone()
        };

        let proc = MockProcessor {
            shard_ids_fn: Some(Box::new(|| vec![0, 1])),
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_get_fn: Some(Box::new(move |observer, path| {
                assert!(path.ends_with(WITH_RESULTS_PARAM));
                if observer == "http://obs-0" {
                    tx_envelope(&source_view)
                } else {
                    tx_envelope(&dest_view)
                }
            })),
            ..MockProcessor::default()
        };

        // A merger that tags its output makes the merge direction visible.
        let merger = MockLogsMerger {
            merge_fn: Some(Box::new(|source, destination| {
                Some(ApiLogs {
                    address: format!(
                        "merged({},{})",
                        source.map(|l| l.address.as_str()).unwrap_or("-"),
                        destination.map(|l| l.address.as_str()).unwrap_or("-"),
                    ),
                    events: Vec::new(),
                })
            })),
        };

        let tx = tx_processor_with(proc, merger)
            .get_transaction("cafe", true)
            .await
            .unwrap();

        // Destination view wins for the scalar fields.
        assert_eq!(tx.status, "success");

        let hashes: Vec<&str> = tx
            .smart_contract_results
            .iter()
            .map(|s| s.hash.as_str())
            .collect();
        assert_eq!(hashes, vec!["A", "B", "C"]);

        let merged_a = &tx.smart_contract_results[0];
        assert_eq!(
            merged_a.logs.as_ref().unwrap().address,
            "merged(L1,L3)"
        );
        assert_eq!(tx.smart_contract_results[1].logs.as_ref().unwrap().address, "L2");
        assert_eq!(tx.smart_contract_results[2].logs.as_ref().unwrap().address, "L4");
    }

    #[tokio::test]
    async fn test_get_transaction_transport_error_tries_next_node_in_shard() {
        let found = ApiTransactionResult {
            hash: "cafe".to_string(),
            status: "success".to_string(),
            sender: addr(0xAA),
            receiver: addr(0xAA),
            ..ApiTransactionResult::default()
        };
        let response = tx_envelope(&found);

        let proc = MockProcessor {
            shard_ids_fn: Some(Box::new(|| vec![0])),
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![
                    NodeData::new("http://obs-down", shard),
                    NodeData::new("http://obs-up", shard),
                ])
            })),
            call_get_fn: Some(Box::new(move |observer, _| {
                if observer == "http://obs-down" {
                    CallOutcome::Skip {
                        status: None,
                        reason: "connection refused".to_string(),
                    }
                } else {
                    response.clone()
                }
            })),
            ..MockProcessor::default()
        };

        let tx = tx_processor(proc).get_transaction("cafe", false).await.unwrap();
        assert_eq!(tx.status, "success");
    }

    #[tokio::test]
    async fn test_get_transaction_not_found_anywhere() {
        let proc = MockProcessor {
            shard_ids_fn: Some(Box::new(|| vec![0, 1])),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_get_fn: Some(Box::new(|_, _| skip(StatusCode::NOT_FOUND))),
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .get_transaction("cafe", false)
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::TransactionNotFound);
    }

    #[tokio::test]
    async fn test_get_transaction_with_sender_skips_shard_search() {
        let shards_asked = Arc::new(Mutex::new(Vec::<ShardId>::new()));
        let seen = Arc::clone(&shards_asked);

        let found = ApiTransactionResult {
            hash: "cafe".to_string(),
            status: "success".to_string(),
            sender: addr(0xBB),
            receiver: addr(0xBB),
            ..ApiTransactionResult::default()
        };
        let response = tx_envelope(&found);

        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(move |shard| {
                seen.lock().push(shard);
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_get_fn: Some(Box::new(move |_, _| response.clone())),
            ..MockProcessor::default()
        };

        let tx = tx_processor(proc)
            .get_transaction_by_hash_and_sender_address("cafe", &addr(0xBB), false)
            .await
            .unwrap();
        assert_eq!(tx.status, "success");
        // Only the sender's shard was consulted.
        assert_eq!(*shards_asked.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_transaction_status_with_sender_hint() {
        let found = ApiTransactionResult {
            status: "executed".to_string(),
            sender: addr(0xAA),
            receiver: addr(0xAA),
            ..ApiTransactionResult::default()
        };
        let response = tx_envelope(&found);

        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs", shard)])
            })),
            call_get_fn: Some(Box::new(move |_, _| response.clone())),
            ..MockProcessor::default()
        };

        let status = tx_processor(proc)
            .get_transaction_status("cafe", &addr(0xAA))
            .await
            .unwrap();
        assert_eq!(status, "executed");
    }

    #[tokio::test]
    async fn test_transaction_status_not_found() {
        let proc = MockProcessor {
            shard_ids_fn: Some(Box::new(|| vec![0])),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs", shard)])
            })),
            call_get_fn: Some(Box::new(|_, _| skip(StatusCode::NOT_FOUND))),
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .get_transaction_status("cafe", "")
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::TransactionNotFound);
    }

    #[tokio::test]
    async fn test_transaction_cost_uses_fresh_handler() {
        let proc = MockProcessor::default();
        let processor = TransactionProcessor::new(
            Arc::new(proc),
            Arc::new(MockPubkeyConverter::default()),
            Arc::new(Keccak256Hasher),
            Arc::new(JsonMarshalizer),
            Arc::new(|| {
                let handler = MockTxCostHandler {
                    resolve_fn: Some(Box::new(|_| {
                        Ok(TxCostData {
                            tx_gas_units: 57_500,
                            return_message: String::new(),
                        })
                    })),
                };
                Ok(Box::new(handler) as Box<dyn TransactionCostHandler>)
            }),
            Arc::new(MockLogsMerger::default()),
            true,
        );

        let cost = processor
            .transaction_cost_request(&valid_tx(0xAA, 0xBB))
            .await
            .unwrap();
        assert_eq!(cost.tx_gas_units, 57_500);
    }

    #[tokio::test]
    async fn test_entire_pool_fetch_can_be_disabled() {
        let processor = TransactionProcessor::new(
            Arc::new(MockProcessor::default()),
            Arc::new(MockPubkeyConverter::default()),
            Arc::new(Keccak256Hasher),
            Arc::new(JsonMarshalizer),
            Arc::new(|| {
                Ok(Box::new(MockTxCostHandler::default()) as Box<dyn TransactionCostHandler>)
            }),
            Arc::new(MockLogsMerger::default()),
            false,
        );

        assert_eq!(
            processor.get_transactions_pool("").await.unwrap_err(),
            ProcessError::OperationNotAllowed
        );
        assert_eq!(
            processor
                .get_transactions_pool_for_shard(0, "")
                .await
                .unwrap_err(),
            ProcessError::OperationNotAllowed
        );
    }

    #[tokio::test]
    async fn test_pool_aggregate_reports_dropped_shards() {
        let proc = MockProcessor {
            shard_ids_fn: Some(Box::new(|| vec![0, 1])),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new(format!("http://obs-{shard}"), shard)])
            })),
            call_get_fn: Some(Box::new(|observer, path| {
                assert!(path.starts_with(TRANSACTIONS_POOL_PATH));
                if observer == "http://obs-0" {
                    envelope(json!({"txPool": {
                        "regularTransactions": [{"txFields": {"hash": "aa"}}],
                        "smartContractResults": [{"txFields": {"hash": "bb"}}],
                        "rewards": []
                    }}))
                } else {
                    skip(StatusCode::REQUEST_TIMEOUT)
                }
            })),
            ..MockProcessor::default()
        };

        let pool = tx_processor(proc).get_transactions_pool("hash").await.unwrap();
        assert_eq!(pool.regular_transactions.len(), 1);
        assert_eq!(pool.smart_contract_results.len(), 1);
        assert_eq!(pool.dropped_shards, vec![1]);
    }

    #[tokio::test]
    async fn test_pool_for_sender_is_empty_on_total_failure() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs", shard)])
            })),
            call_get_fn: Some(Box::new(|_, _| skip(StatusCode::NOT_FOUND))),
            ..MockProcessor::default()
        };

        let pool = tx_processor(proc)
            .get_transactions_pool_for_sender(&addr(0xAA), "hash")
            .await
            .unwrap();
        assert!(pool.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_last_pool_nonce_for_sender() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs", shard)])
            })),
            call_get_fn: Some(Box::new(|_, path| {
                assert!(path.contains("last-nonce=true"));
                envelope(json!({"nonce": 37}))
            })),
            ..MockProcessor::default()
        };

        let nonce = tx_processor(proc)
            .get_last_pool_nonce_for_sender(&addr(0xAA))
            .await
            .unwrap();
        assert_eq!(nonce, 37);
    }

    #[tokio::test]
    async fn test_last_pool_nonce_exhaustion() {
        let proc = MockProcessor {
            compute_shard_id_fn: Some(shard_of_first_byte()),
            observers_fn: Some(Box::new(|shard| {
                Ok(vec![NodeData::new("http://obs", shard)])
            })),
            call_get_fn: Some(Box::new(|_, _| skip(StatusCode::NOT_FOUND))),
            ..MockProcessor::default()
        };

        let err = tx_processor(proc)
            .get_last_pool_nonce_for_sender(&addr(0xAA))
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::TransactionsNotFoundInPool);
    }

    #[test]
    fn test_compute_transaction_hash_is_deterministic() {
        let processor = tx_processor(MockProcessor::default());
        let tx = valid_tx(0xAA, 0xBB);

        let first = processor.compute_transaction_hash(&tx).unwrap();
        let second = processor.compute_transaction_hash(&tx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let mut other = tx;
        other.nonce += 1;
        assert_ne!(processor.compute_transaction_hash(&other).unwrap(), first);
    }

    #[test]
    fn test_compute_transaction_hash_field_validation() {
        let processor = tx_processor(MockProcessor::default());

        let mut tx = valid_tx(0xAA, 0xBB);
        tx.value = "not-a-number".to_string();
        assert_eq!(
            processor.compute_transaction_hash(&tx).unwrap_err(),
            ProcessError::InvalidTransactionValueField
        );

        let mut tx = valid_tx(0xAA, 0xBB);
        tx.sender = "xx".to_string();
        assert_eq!(
            processor.compute_transaction_hash(&tx).unwrap_err(),
            ProcessError::InvalidAddress
        );

        let mut tx = valid_tx(0xAA, 0xBB);
        tx.signature = "zz".to_string();
        assert_eq!(
            processor.compute_transaction_hash(&tx).unwrap_err(),
            ProcessError::InvalidSignatureBytes
        );
    }
}
