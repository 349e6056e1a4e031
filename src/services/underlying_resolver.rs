use alloy::primitives::Address;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::adapters::{AdapterError, DeFiAdapter, RateComposer};
use crate::config::ResolverSettings;
use crate::error::{with_retry, ResolverError, RetryConfig};
use crate::models::{Chain, ConversionResult, MovementRecord, TokenBalance, TokenType, Underlying};
use crate::registry::AdapterRegistry;
use crate::services::price_fallback::PriceFallback;

/// Chain and block every lookup of one pass is made against
#[derive(Debug, Clone, Copy)]
struct PassContext {
    chain: Chain,
    block_number: Option<u64>,
}

/// Recursively expands protocol-token positions into their underlying tokens.
///
/// Each pass builds a new tree: caller input is only read. Siblings at every
/// level are resolved concurrently within the calling task. A branch stops at
/// a token without a registered adapter (priced through [`PriceFallback`]), at
/// a soft failure, or when it would revisit one of its own ancestors.
pub struct UnderlyingResolver {
    registry: Arc<dyn AdapterRegistry>,
    price_fallback: PriceFallback,
    settings: ResolverSettings,
    retry: RetryConfig,
}

impl UnderlyingResolver {
    pub fn new(registry: Arc<dyn AdapterRegistry>, settings: ResolverSettings) -> Self {
        let price_fallback = PriceFallback::new(registry.clone(), &settings);
        let retry = settings.retry_config();

        Self {
            registry,
            price_fallback,
            settings,
            retry,
        }
    }

    /// Fully expand every position, returning the resolved trees in input order
    pub async fn resolve_positions(
        &self,
        positions: &[Underlying],
        chain: Chain,
        block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, ResolverError> {
        info!(
            chain = %chain,
            block_number = ?block_number,
            position_count = positions.len(),
            "Resolving underlying tokens for positions"
        );

        let ctx = PassContext { chain, block_number };
        let resolved = self.resolve_frontier(positions, ctx, &HashSet::new(), 0).await?;

        info!(
            chain = %chain,
            position_count = resolved.len(),
            unresolved_leaves = count_unresolved(&resolved),
            "Position resolution complete"
        );

        Ok(resolved)
    }

    /// Expand the underlying deltas of each movement at that movement's own block
    pub async fn resolve_movements(
        &self,
        records: &[MovementRecord],
        chain: Chain,
    ) -> Result<Vec<MovementRecord>, ResolverError> {
        info!(
            chain = %chain,
            movement_count = records.len(),
            "Resolving underlying tokens for movements"
        );

        let resolved =
            try_join_all(records.iter().map(|record| self.resolve_movement(record, chain))).await?;

        info!(
            chain = %chain,
            movement_count = resolved.len(),
            "Movement resolution complete"
        );

        Ok(resolved)
    }

    /// Decompose raw protocol-token balances through their owning adapter, then
    /// expand the result like any other position list.
    ///
    /// A balance whose contract was not deployed at `block_number` comes back
    /// in place as an unresolved protocol position and is never expanded.
    pub async fn resolve_protocol_balances(
        &self,
        adapter: &dyn DeFiAdapter,
        balances: &[TokenBalance],
        user: Option<Address>,
        chain: Chain,
        block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, ResolverError> {
        let decomposed = try_join_all(balances.iter().map(|balance| async move {
            match adapter.balances_of(balance, user, block_number).await {
                Ok(underlyings) => Ok(Some(protocol_position(balance).with_tokens(underlyings))),
                Err(error) if error.is_not_deployed() => {
                    debug!(
                        chain = %chain,
                        token = %balance.address(),
                        "Protocol token not deployed at block, skipping decomposition"
                    );
                    Ok(None)
                }
                Err(source) => Err(ResolverError::Adapter {
                    protocol: adapter.protocol_name().to_string(),
                    token: balance.address(),
                    source,
                }),
            }
        }))
        .await?;

        let deployed: Vec<bool> = decomposed.iter().map(Option::is_some).collect();
        let positions: Vec<Underlying> = decomposed.into_iter().flatten().collect();
        let mut expanded = self
            .resolve_positions(&positions, chain, block_number)
            .await?
            .into_iter();

        Ok(balances
            .iter()
            .zip(deployed)
            .map(|(balance, deployed)| {
                deployed
                    .then(|| expanded.next())
                    .flatten()
                    .unwrap_or_else(|| protocol_position(balance))
            })
            .collect())
    }

    async fn resolve_movement(
        &self,
        record: &MovementRecord,
        chain: Chain,
    ) -> Result<MovementRecord, ResolverError> {
        let ctx = PassContext {
            chain,
            block_number: Some(record.block_number),
        };
        let ancestors = HashSet::from([record.protocol_token.address]);
        let tokens = self.resolve_frontier(&record.tokens, ctx, &ancestors, 1).await?;

        debug!(
            chain = %chain,
            transaction_hash = %record.transaction_hash,
            block_number = record.block_number,
            "Resolved movement"
        );

        Ok(MovementRecord {
            transaction_hash: record.transaction_hash,
            block_number: record.block_number,
            protocol_token: record.protocol_token.clone(),
            tokens,
            from: record.from,
            to: record.to,
        })
    }

    /// Resolve sibling nodes concurrently; a hard error in any branch fails the level
    fn resolve_frontier<'a>(
        &'a self,
        nodes: &'a [Underlying],
        ctx: PassContext,
        ancestors: &'a HashSet<Address>,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<Underlying>, ResolverError>> {
        async move {
            try_join_all(nodes.iter().map(|node| self.resolve_node(node, ctx, ancestors, depth)))
                .await
        }
        .boxed()
    }

    async fn resolve_node(
        &self,
        node: &Underlying,
        ctx: PassContext,
        ancestors: &HashSet<Address>,
        depth: usize,
    ) -> Result<Underlying, ResolverError> {
        let token = node.address();

        // Children supplied by the owning adapter are expanded, never re-fetched
        if let Some(children) = &node.tokens {
            let path = with_ancestor(ancestors, token);
            let children = self.resolve_frontier(children, ctx, &path, depth + 1).await?;
            return Ok(rebuild(node, children));
        }

        if node.price_raw.is_some() {
            return Ok(node.clone());
        }

        if ancestors.contains(&token) {
            warn!(
                chain = %ctx.chain,
                token = %token,
                depth,
                "Token is its own ancestor, leaving unresolved"
            );
            return Ok(node.clone());
        }

        let lookup = self.registry.token_adapter(ctx.chain, token);
        let adapter = match timeout(self.settings.branch_timeout(), lookup).await {
            Ok(Some(adapter)) => adapter,
            // Pricing never recurses, so it still runs at the depth limit
            Ok(None) => {
                let price = self.price_fallback.price_of(ctx.chain, token, ctx.block_number).await;
                return Ok(match price {
                    Some(price_raw) => node.clone().with_price(price_raw),
                    None => node.clone(),
                });
            }
            Err(_) => {
                warn!(
                    chain = %ctx.chain,
                    token = %token,
                    "Adapter lookup timed out, leaving unresolved"
                );
                return Ok(node.clone());
            }
        };

        if depth >= self.settings.max_depth {
            warn!(
                chain = %ctx.chain,
                token = %token,
                max_depth = self.settings.max_depth,
                "Maximum resolution depth reached, leaving unresolved"
            );
            return Ok(node.clone());
        }

        let rate = match self.fetch_rate(adapter.as_ref(), token, ctx).await? {
            Some(rate) => rate,
            None => return Ok(node.clone()),
        };

        let children =
            RateComposer::compose(&node.balance, &rate).map_err(|source| ResolverError::Adapter {
                protocol: adapter.protocol_name().to_string(),
                token,
                source,
            })?;

        debug!(
            chain = %ctx.chain,
            token = %token,
            protocol = adapter.protocol_name(),
            underlying_count = children.len(),
            depth,
            "Decomposed token"
        );

        let path = with_ancestor(ancestors, token);
        let children = self.resolve_frontier(&children, ctx, &path, depth + 1).await?;
        Ok(rebuild(node, children))
    }

    /// `Ok(None)` for soft failures: not deployed at the block, or timed out
    async fn fetch_rate(
        &self,
        adapter: &dyn DeFiAdapter,
        token: Address,
        ctx: PassContext,
    ) -> Result<Option<ConversionResult>, ResolverError> {
        let call = with_retry("rate_of", &self.retry, || adapter.rate_of(token, ctx.block_number));

        match timeout(self.settings.branch_timeout(), call).await {
            Ok(Ok(rate)) => Ok(Some(rate)),
            Ok(Err(AdapterError::NotDeployedAtBlock { block_number, .. })) => {
                debug!(
                    chain = %ctx.chain,
                    token = %token,
                    block_number,
                    "Token not deployed at block, leaving unresolved"
                );
                Ok(None)
            }
            Ok(Err(source)) => Err(ResolverError::Adapter {
                protocol: adapter.protocol_name().to_string(),
                token,
                source,
            }),
            Err(_) => {
                warn!(
                    chain = %ctx.chain,
                    token = %token,
                    protocol = adapter.protocol_name(),
                    timeout_ms = self.settings.branch_timeout_ms,
                    "Rate lookup timed out, leaving unresolved"
                );
                Ok(None)
            }
        }
    }
}

fn protocol_position(balance: &TokenBalance) -> Underlying {
    Underlying::new(balance.token.clone(), balance.balance_raw).with_type(TokenType::Protocol)
}

fn with_ancestor(ancestors: &HashSet<Address>, token: Address) -> HashSet<Address> {
    let mut path = ancestors.clone();
    path.insert(token);
    path
}

fn rebuild(node: &Underlying, children: Vec<Underlying>) -> Underlying {
    Underlying {
        balance: node.balance.clone(),
        token_type: node.token_type,
        tokens: Some(children),
        price_raw: None,
    }
}

fn count_unresolved(nodes: &[Underlying]) -> usize {
    nodes
        .iter()
        .flat_map(Underlying::leaves)
        .filter(|leaf| !leaf.is_settled())
        .count()
}
