//! nflverse dataset client
//!
//! Fetches the released CSV datasets and parses them into in-memory tables.
//! Datasets sharded by season are fetched once per configured season and
//! concatenated; single-file datasets are filtered on their `season` column.

use crate::data::table::{Table, Value, MISSING_SENTINELS};
use crate::{GridironError, Result};

const RELEASE_BASE: &str = "https://github.com/nflverse/nflverse-data/releases/download";
const NFLDATA_BASE: &str = "https://raw.githubusercontent.com/nflverse/nfldata/master/data";

/// One upstream dataset, named by its destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Weekly,
    Seasonal,
    TeamDescriptions,
    Players,
    WinTotals,
    ScoreLines,
    Officials,
    DraftPicks,
    DraftValues,
    Combine,
    Schedules,
    Ids,
    NgsPassing,
    NgsReceiving,
    NgsRushing,
    Injuries,
    Qbr,
    SeasonalPfrPass,
    SeasonalPfrRec,
    SeasonalPfrRush,
    SeasonalPfrDef,
    WeeklyPfrPass,
    WeeklyPfrRec,
    WeeklyPfrRush,
    WeeklyPfrDef,
    SnapCounts,
}

impl Dataset {
    /// Every dataset, in load order
    pub const ALL: [Dataset; 26] = [
        Dataset::Weekly,
        Dataset::Seasonal,
        Dataset::TeamDescriptions,
        Dataset::Players,
        Dataset::WinTotals,
        Dataset::ScoreLines,
        Dataset::Officials,
        Dataset::DraftPicks,
        Dataset::DraftValues,
        Dataset::Combine,
        Dataset::Schedules,
        Dataset::Ids,
        Dataset::NgsPassing,
        Dataset::NgsReceiving,
        Dataset::NgsRushing,
        Dataset::Injuries,
        Dataset::Qbr,
        Dataset::SeasonalPfrPass,
        Dataset::SeasonalPfrRec,
        Dataset::SeasonalPfrRush,
        Dataset::SeasonalPfrDef,
        Dataset::WeeklyPfrPass,
        Dataset::WeeklyPfrRec,
        Dataset::WeeklyPfrRush,
        Dataset::WeeklyPfrDef,
        Dataset::SnapCounts,
    ];

    /// Destination table name
    pub fn table_name(&self) -> &'static str {
        match self {
            Dataset::Weekly => "weekly",
            Dataset::Seasonal => "seasonal",
            Dataset::TeamDescriptions => "team_descriptions",
            Dataset::Players => "players",
            Dataset::WinTotals => "win_totals",
            Dataset::ScoreLines => "score_lines",
            Dataset::Officials => "officials",
            Dataset::DraftPicks => "draft_picks",
            Dataset::DraftValues => "draft_values",
            Dataset::Combine => "combine",
            Dataset::Schedules => "schedules",
            Dataset::Ids => "ids",
            Dataset::NgsPassing => "ngs_pass",
            Dataset::NgsReceiving => "ngs_rec",
            Dataset::NgsRushing => "ngs_rush",
            Dataset::Injuries => "injuries",
            Dataset::Qbr => "qbr",
            Dataset::SeasonalPfrPass => "seasonal_pfr_pass",
            Dataset::SeasonalPfrRec => "seasonal_pfr_rec",
            Dataset::SeasonalPfrRush => "seasonal_pfr_rush",
            Dataset::SeasonalPfrDef => "seasonal_pfr_def",
            Dataset::WeeklyPfrPass => "weekly_pfr_pass",
            Dataset::WeeklyPfrRec => "weekly_pfr_rec",
            Dataset::WeeklyPfrRush => "weekly_pfr_rush",
            Dataset::WeeklyPfrDef => "weekly_pfr_def",
            Dataset::SnapCounts => "snap_counts",
        }
    }

    /// URLs to fetch for the given seasons
    fn urls(&self, seasons: &[u16]) -> Vec<String> {
        let per_season = |release: &str, prefix: &str| -> Vec<String> {
            seasons
                .iter()
                .map(|y| format!("{}/{}/{}_{}.csv", RELEASE_BASE, release, prefix, y))
                .collect()
        };
        let single = |url: String| vec![url];

        match self {
            Dataset::Weekly => per_season("player_stats", "player_stats"),
            Dataset::Seasonal => per_season("player_stats", "player_stats_season"),
            Dataset::TeamDescriptions => {
                single(format!("{}/teams.csv", NFLDATA_BASE))
            }
            Dataset::Players => single(format!("{}/players/players.csv", RELEASE_BASE)),
            Dataset::WinTotals => single(format!("{}/win_totals.csv", NFLDATA_BASE)),
            Dataset::ScoreLines => single(format!("{}/sc_lines.csv", NFLDATA_BASE)),
            Dataset::Officials => single(format!("{}/officials.csv", NFLDATA_BASE)),
            Dataset::DraftPicks => {
                single(format!("{}/draft_picks/draft_picks.csv", RELEASE_BASE))
            }
            Dataset::DraftValues => {
                single(format!("{}/draft_values/draft_values.csv", RELEASE_BASE))
            }
            Dataset::Combine => single(format!("{}/combine/combine.csv", RELEASE_BASE)),
            Dataset::Schedules => single(format!("{}/games.csv", NFLDATA_BASE)),
            Dataset::Ids => single(format!("{}/players_components/ids.csv", RELEASE_BASE)),
            Dataset::NgsPassing => per_season("nextgen_stats", "ngs_passing"),
            Dataset::NgsReceiving => per_season("nextgen_stats", "ngs_receiving"),
            Dataset::NgsRushing => per_season("nextgen_stats", "ngs_rushing"),
            Dataset::Injuries => per_season("injuries", "injuries"),
            Dataset::Qbr => single(format!("{}/espn_data/qbr_season_level.csv", RELEASE_BASE)),
            Dataset::SeasonalPfrPass => per_season("pfr_advstats", "advstats_season_pass"),
            Dataset::SeasonalPfrRec => per_season("pfr_advstats", "advstats_season_rec"),
            Dataset::SeasonalPfrRush => per_season("pfr_advstats", "advstats_season_rush"),
            Dataset::SeasonalPfrDef => per_season("pfr_advstats", "advstats_season_def"),
            Dataset::WeeklyPfrPass => per_season("pfr_advstats", "advstats_week_pass"),
            Dataset::WeeklyPfrRec => per_season("pfr_advstats", "advstats_week_rec"),
            Dataset::WeeklyPfrRush => per_season("pfr_advstats", "advstats_week_rush"),
            Dataset::WeeklyPfrDef => per_season("pfr_advstats", "advstats_week_def"),
            Dataset::SnapCounts => per_season("snap_counts", "snap_counts"),
        }
    }

    /// Single-file datasets that cover all seasons get filtered afterwards
    fn filter_by_season(&self) -> bool {
        matches!(
            self,
            Dataset::WinTotals
                | Dataset::ScoreLines
                | Dataset::Officials
                | Dataset::Schedules
                | Dataset::Qbr
        )
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// Blocking HTTP client for nflverse releases
pub struct Provider {
    client: reqwest::blocking::Client,
}

impl Provider {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("gridiron/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Provider { client })
    }

    /// Fetch one dataset for the given seasons
    pub fn fetch(&self, dataset: Dataset, seasons: &[u16]) -> Result<Table> {
        let mut combined: Option<Table> = None;

        for url in dataset.urls(seasons) {
            log::info!("Fetching {} from {}", dataset, url);
            let body = match self.get(&url) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("Failed to fetch {}: {}", url, e);
                    continue;
                }
            };
            let table = parse_csv(&body)?;
            match combined {
                None => combined = Some(table),
                Some(ref mut t) => t.append(table)?,
            }
        }

        let mut table = combined.ok_or_else(|| GridironError::Provider {
            dataset: dataset.table_name().to_string(),
            message: "no data fetched".to_string(),
        })?;

        if dataset.filter_by_season() {
            filter_seasons(&mut table, seasons);
        }

        log::info!("Fetched {} rows for {}", table.row_count(), dataset);
        Ok(table)
    }

    fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(GridironError::Provider {
                dataset: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }
        Ok(response.text()?)
    }
}

/// Parse CSV text into a table
pub fn parse_csv(text: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut table = Table::new(headers);

    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(parse_field).collect());
    }
    Ok(table)
}

/// Map a CSV field to a value: sentinel, integer, float, or text
fn parse_field(field: &str) -> Value {
    let trimmed = field.trim();
    if MISSING_SENTINELS.contains(&trimmed) {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Text(field.to_string())
}

/// Keep only rows whose `season` column matches one of the given seasons
fn filter_seasons(table: &mut Table, seasons: &[u16]) {
    let Some(idx) = table.column_index("season") else {
        return;
    };
    table.retain_rows(|row| match row.get(idx) {
        Some(Value::Integer(season)) => seasons.iter().any(|s| i64::from(*s) == *season),
        _ => false,
    });
}
