//! Advertisement command handlers with boundary logging.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for advertisement operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.
//!
//! Every error leaving this module carries the request's correlation ids.

use std::time::Instant;

use adplace_core::errors::ExError;
use adplace_core::model::{unix_now, AdView, Advertisement, NewAdvertisement};
use adplace_core::queries::{SelectAdsArgs, UpdateAdsArgs};
use adplace_core::stats::AdStats;
use adplace_core::{log_op_end, log_op_error, log_op_start};
use adplace_core_types::RequestContext;
use adplace_store::errors::Result;
use adplace_store::{repo, AdStore, OpContext, SessionMode};

use crate::metrics::AdMetrics;

fn correlate(err: ExError, request: &RequestContext) -> ExError {
    let err = err.with_request_id(request.request_id.clone());
    match &request.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}

/// Create and persist a new advertisement
///
/// Assigns the id, sets the status to active and derives the expiration from
/// the TTL before inserting.
///
/// ## Errors
///
/// - `Validation`: a field breaks the creation rules
/// - `Storage`: the insert failed
pub fn create_ad(
    store: &AdStore,
    metrics: &AdMetrics,
    ctx: &OpContext,
    request: &RequestContext,
    new: NewAdvertisement,
) -> Result<AdView> {
    log_op_start!(
        "create_ad",
        placement = %new.placement,
        request_id = %request.request_id
    );
    let start = Instant::now();

    let view = create_ad_impl(store, ctx, new, unix_now()).map_err(|e| {
        let e = correlate(e, request);
        log_op_error!(
            "create_ad",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request.request_id
        );
        e
    })?;
    metrics.record_created();

    log_op_end!(
        "create_ad",
        duration_ms = start.elapsed().as_millis() as u64,
        ad_id = %view.ad.id
    );
    Ok(view)
}

fn create_ad_impl(
    store: &AdStore,
    ctx: &OpContext,
    new: NewAdvertisement,
    now: i64,
) -> Result<AdView> {
    let ad = Advertisement::create(new, now).map_err(|e| ExError::from(e).with_op("create_ad"))?;
    store.insert(ctx, &ad)?;
    Ok(ad.into_view(now))
}

/// Fetch one advertisement with its expiration flag
///
/// ## Errors
///
/// - `Validation`: empty id
/// - `NotFound`: unknown id
/// - `Storage`: the read failed
pub fn get_ad(
    store: &AdStore,
    ctx: &OpContext,
    request: &RequestContext,
    id: &str,
) -> Result<AdView> {
    log_op_start!("get_ad", ad_id = id, request_id = %request.request_id);
    let start = Instant::now();

    let view = store
        .get(ctx, id)
        .map(|ad| ad.into_view(unix_now()))
        .map_err(|e| {
            let e = correlate(e, request);
            log_op_error!(
                "get_ad",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                ad_id = id
            );
            e
        })?;

    log_op_end!(
        "get_ad",
        duration_ms = start.elapsed().as_millis() as u64,
        ad_id = id
    );
    Ok(view)
}

/// List advertisements matching every supplied filter, newest first
///
/// Empty string filters are treated as absent. The expiration flag of every
/// returned view is computed against the same instant the `expired` filter
/// used.
///
/// ## Errors
///
/// - `QueryBuild`: the filter could not be turned into a query
/// - `Storage`: the read failed
pub fn list_ads(
    store: &AdStore,
    ctx: &OpContext,
    request: &RequestContext,
    args: SelectAdsArgs,
) -> Result<Vec<AdView>> {
    log_op_start!("list_ads", request_id = %request.request_id);
    let start = Instant::now();

    let views = list_ads_impl(store, ctx, args.normalized(), unix_now()).map_err(|e| {
        let e = correlate(e, request);
        log_op_error!(
            "list_ads",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "list_ads",
        duration_ms = start.elapsed().as_millis() as u64,
        result_len = views.len()
    );
    Ok(views)
}

fn list_ads_impl(
    store: &AdStore,
    ctx: &OpContext,
    args: SelectAdsArgs,
    now: i64,
) -> Result<Vec<AdView>> {
    let ads = store.select_at(ctx, &args, now)?;
    Ok(ads.into_iter().map(|ad| ad.into_view(now)).collect())
}

/// Mark an advertisement inactive
///
/// Deactivating an already inactive advertisement succeeds and changes
/// nothing.
///
/// ## Errors
///
/// - `Validation`: empty id
/// - `NotFound`: unknown id
/// - `Storage`: the write failed
pub fn deactivate_ad(
    store: &AdStore,
    metrics: &AdMetrics,
    ctx: &OpContext,
    request: &RequestContext,
    id: &str,
) -> Result<()> {
    log_op_start!("deactivate_ad", ad_id = id, request_id = %request.request_id);
    let start = Instant::now();

    store
        .update(ctx, &UpdateAdsArgs::deactivate(id))
        .map_err(|e| {
            let e = correlate(e, request);
            log_op_error!(
                "deactivate_ad",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                ad_id = id
            );
            e
        })?;
    metrics.record_deactivated();

    log_op_end!(
        "deactivate_ad",
        duration_ms = start.elapsed().as_millis() as u64,
        ad_id = id
    );
    Ok(())
}

/// Apply a partial update and return the record as stored afterwards
///
/// The update and the read-back share one read-write session.
///
/// ## Errors
///
/// - `Validation`: empty id or a bad supplied value
/// - `NotFound`: unknown id
/// - `Storage`: the write failed
pub fn update_ad(
    store: &AdStore,
    ctx: &OpContext,
    request: &RequestContext,
    args: UpdateAdsArgs,
) -> Result<AdView> {
    log_op_start!("update_ad", ad_id = %args.id, request_id = %request.request_id);
    let start = Instant::now();

    let view = update_ad_impl(store, ctx, &args).map_err(|e| {
        let e = correlate(e, request);
        log_op_error!(
            "update_ad",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            ad_id = %args.id
        );
        e
    })?;

    log_op_end!(
        "update_ad",
        duration_ms = start.elapsed().as_millis() as u64,
        ad_id = %args.id
    );
    Ok(view)
}

fn update_ad_impl(store: &AdStore, ctx: &OpContext, args: &UpdateAdsArgs) -> Result<AdView> {
    let session = store.begin(ctx, SessionMode::ReadWrite)?;
    repo::update_ads(&session, args)?;
    let ad = repo::get_ad(&session, &args.id)?;
    session.commit()?;
    Ok(ad.into_view(unix_now()))
}

/// Aggregate counts over every stored advertisement
///
/// Also refreshes the gauges in `metrics`.
///
/// ## Errors
///
/// - `Storage`: the read failed
pub fn ad_stats(
    store: &AdStore,
    metrics: &AdMetrics,
    ctx: &OpContext,
    request: &RequestContext,
) -> Result<AdStats> {
    log_op_start!("ad_stats", request_id = %request.request_id);
    let start = Instant::now();

    let now = unix_now();
    let stats = store
        .select_at(ctx, &SelectAdsArgs::all(), now)
        .map(|ads| AdStats::collect(&ads, now))
        .map_err(|e| {
            let e = correlate(e, request);
            log_op_error!(
                "ad_stats",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;
    metrics.observe(&stats);

    log_op_end!(
        "ad_stats",
        duration_ms = start.elapsed().as_millis() as u64,
        result_len = stats.total
    );
    Ok(stats)
}
