//! Weather forecast controller.

use std::sync::Arc;

use axum::{routing::get, Json};
use chrono::{Days, Local, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::filters::LogAttribute;
use crate::mvc::{Action, ControllerRoutes};
use crate::services::ServiceProvider;

pub const SUMMARIES: [&str; 10] = [
    "Freezing", "Bracing", "Chilly", "Cool", "Mild", "Warm", "Balmy", "Hot", "Sweltering", "Scorching",
];

/// Number of days returned by `Get`.
const FORECAST_DAYS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
}

impl WeatherForecast {
    pub fn new(date: NaiveDate, temperature_c: i32, summary: Option<String>) -> Self {
        Self {
            date,
            temperature_c,
            temperature_f: 32 + (temperature_c as f64 / 0.5556) as i32,
            summary,
        }
    }
}

pub fn controller(services: Arc<ServiceProvider>) -> ControllerRoutes {
    ControllerRoutes::new("WeatherForecast", "/weatherforecast", services)
        .action(Action::new("Get", "/", get(get_forecasts)).filter(LogAttribute))
        .action(Action::new("Summaries", "/summaries", get(get_summaries)))
}

async fn get_forecasts() -> Json<Vec<WeatherForecast>> {
    Json(forecasts(Local::now().date_naive()))
}

async fn get_summaries() -> Json<Vec<&'static str>> {
    Json(SUMMARIES.to_vec())
}

/// Random forecasts for the days following `today`.
pub fn forecasts(today: NaiveDate) -> Vec<WeatherForecast> {
    let mut rng = rand::thread_rng();
    (1..=FORECAST_DAYS)
        .map(|offset| {
            WeatherForecast::new(
                today + Days::new(offset),
                rng.gen_range(-20..55),
                SUMMARIES.choose(&mut rng).map(|s| s.to_string()),
            )
        })
        .collect()
}
