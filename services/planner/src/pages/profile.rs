//! Profile page controller: bio, glow progress and the yearly heatmap

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{info, warn};

use crate::{
    models::{DailyLog, UserProfile},
    services::DailyLogService,
};

/// Glow points a user aims for each month
pub const MONTHLY_GLOW_TARGET: u32 = 600;

/// Shade of a heatmap cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlowIntensity {
    None,
    Low,
    Medium,
    High,
}

impl GlowIntensity {
    pub fn from_points(points: u32) -> Self {
        match points {
            0 => GlowIntensity::None,
            1..=10 => GlowIntensity::Low,
            11..=30 => GlowIntensity::Medium,
            _ => GlowIntensity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub points: u32,
    pub intensity: GlowIntensity,
}

/// Controller behind the profile view
pub struct ProfilePage {
    logs: DailyLogService,
    profile: UserProfile,
    entries: Vec<DailyLog>,
}

impl ProfilePage {
    pub fn new(logs: DailyLogService, profile: UserProfile) -> Self {
        Self {
            logs,
            profile,
            entries: Vec::new(),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn logs(&self) -> &[DailyLog] {
        &self.entries
    }

    /// Fetch the user's daily logs; on failure the current ones are kept
    pub async fn load_logs(&mut self) {
        match self.logs.get_logs().await {
            Ok(logs) => {
                info!("Loaded {} daily log(s)", logs.len());
                self.entries = logs;
            }
            Err(e) => warn!("Error fetching daily logs: {}", e),
        }
    }

    /// Edit the bio; not persisted
    pub fn update_bio(&mut self, bio: impl Into<String>) {
        self.profile.bio = Some(bio.into());
    }

    pub fn progress_percentage(&self) -> f64 {
        progress_percentage(self.profile.total_glow_points, MONTHLY_GLOW_TARGET)
    }

    pub fn streak_days(&self, today: NaiveDate) -> u32 {
        current_streak(&self.entries, today)
    }

    pub fn heatmap(&self, year: i32) -> Vec<HeatmapCell> {
        glow_heatmap(&self.entries, year)
    }
}

/// Progress toward `target`, capped at 100
pub fn progress_percentage(points: u32, target: u32) -> f64 {
    if target == 0 {
        return 100.0;
    }
    (f64::from(points) / f64::from(target) * 100.0).min(100.0)
}

fn points_by_day(logs: &[DailyLog]) -> HashMap<NaiveDate, u32> {
    let mut points = HashMap::new();
    for log in logs {
        *points.entry(log.date).or_insert(0) += log.glow_points;
    }
    points
}

/// One cell per day of `year`
pub fn glow_heatmap(logs: &[DailyLog], year: i32) -> Vec<HeatmapCell> {
    let points = points_by_day(logs);
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|date| date.year() == year)
        .map(|date| {
            let points = points.get(&date).copied().unwrap_or(0);
            HeatmapCell {
                date,
                points,
                intensity: GlowIntensity::from_points(points),
            }
        })
        .collect()
}

/// Consecutive days with points, ending today or yesterday
pub fn current_streak(logs: &[DailyLog], today: NaiveDate) -> u32 {
    let points = points_by_day(logs);
    let glowed = |date: &NaiveDate| points.get(date).is_some_and(|p| *p > 0);

    let mut day = if glowed(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while glowed(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
