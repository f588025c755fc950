//! Advertisement commands

use clap::{Args, Subcommand};
use serde::Serialize;

use adplace_core::{AdStats, AdStatus, NewAdvertisement, SelectAdsArgs, UpdateAdsArgs};
use adplace_engine::commands::ads::{
    ad_stats, create_ad, deactivate_ad, get_ad, list_ads, update_ad,
};
use adplace_engine::AdMetrics;

use super::{print_json, CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct AdsArgs {
    #[command(subcommand)]
    pub command: AdsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdsCommand {
    /// Create an advertisement
    Create(CreateArgs),
    /// Show one advertisement
    Get { id: String },
    /// List advertisements, newest first
    List(ListArgs),
    /// Mark an advertisement inactive
    Deactivate { id: String },
    /// Change some fields of an advertisement
    Update(UpdateArgs),
    /// Counts by status and expiration
    Stats,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub image_url: String,

    #[arg(long)]
    pub placement: String,

    /// Minutes until the ad lapses; 0 or less never expires
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub ttl_minutes: i64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// active or inactive
    #[arg(long)]
    pub status: Option<AdStatus>,

    #[arg(long)]
    pub placement: Option<String>,

    /// Keep only lapsed (true) or only live (false) ads
    #[arg(long)]
    pub expired: Option<bool>,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,

    #[arg(long)]
    pub placement: Option<String>,

    /// active or inactive
    #[arg(long)]
    pub status: Option<AdStatus>,
}

impl From<ListArgs> for SelectAdsArgs {
    fn from(args: ListArgs) -> Self {
        SelectAdsArgs {
            id: args.id,
            title: args.title,
            status: args.status,
            placement: args.placement,
            expired: args.expired,
            limit: args.limit,
            offset: args.offset,
        }
    }
}

impl From<UpdateArgs> for UpdateAdsArgs {
    fn from(args: UpdateArgs) -> Self {
        UpdateAdsArgs {
            id: args.id,
            title: args.title,
            image_url: args.image_url,
            placement: args.placement,
            status: args.status,
        }
    }
}

#[derive(Serialize)]
struct Deactivated<'a> {
    id: &'a str,
    status: AdStatus,
}

/// Gauges refreshed by this run
///
/// The counters are left out: a one-shot process has never seen a create or
/// deactivate when it answers `stats`.
#[derive(Serialize)]
struct Gauges {
    active: i64,
    inactive: i64,
    expired: i64,
}

#[derive(Serialize)]
struct StatsReport {
    stats: AdStats,
    gauges: Gauges,
}

pub fn execute(global: &GlobalArgs, args: AdsArgs) -> CliResult {
    let store = global.open_store()?;
    let ctx = global.op_context();
    let request = global.request_context();
    let metrics = AdMetrics::new()?;

    match args.command {
        AdsCommand::Create(create) => {
            let new = NewAdvertisement::new(create.title, create.image_url, create.placement)
                .with_ttl_minutes(create.ttl_minutes);
            print_json(&create_ad(&store, &metrics, &ctx, &request, new)?)
        }
        AdsCommand::Get { id } => print_json(&get_ad(&store, &ctx, &request, &id)?),
        AdsCommand::List(list) => print_json(&list_ads(&store, &ctx, &request, list.into())?),
        AdsCommand::Deactivate { id } => {
            deactivate_ad(&store, &metrics, &ctx, &request, &id)?;
            print_json(&Deactivated {
                id: &id,
                status: AdStatus::Inactive,
            })
        }
        AdsCommand::Update(update) => {
            print_json(&update_ad(&store, &ctx, &request, update.into())?)
        }
        AdsCommand::Stats => {
            let stats = ad_stats(&store, &metrics, &ctx, &request)?;
            let snap = metrics.snapshot();
            print_json(&StatsReport {
                stats,
                gauges: Gauges {
                    active: snap.active,
                    inactive: snap.inactive,
                    expired: snap.expired,
                },
            })
        }
    }
}
