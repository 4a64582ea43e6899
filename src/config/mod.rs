// Search configuration module
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::DropRateSearchError;

/// 線形探索の方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    TopDown,
    BottomUp,
}

impl Default for SearchDirection {
    fn default() -> Self {
        SearchDirection::TopDown
    }
}

impl SearchDirection {
    pub fn label(&self) -> &'static str {
        match self {
            SearchDirection::TopDown => "top_down",
            SearchDirection::BottomUp => "bottom_up",
        }
    }
}

impl fmt::Display for SearchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchDirection {
    type Err = DropRateSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_down" => Ok(SearchDirection::TopDown),
            "bottom_up" => Ok(SearchDirection::BottomUp),
            other => Err(DropRateSearchError::ConfigError(format!(
                "search direction unknown: {}",
                other
            ))),
        }
    }
}

/// レート単位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    Percentage,
    PacketsPerSecond,
    BitsPerSecond,
}

impl Default for RateType {
    fn default() -> Self {
        RateType::Percentage
    }
}

impl RateType {
    pub fn label(&self) -> &'static str {
        match self {
            RateType::Percentage => "percentage",
            RateType::PacketsPerSecond => "packets_per_second",
            RateType::BitsPerSecond => "bits_per_second",
        }
    }

    /// レート値に付ける単位文字列 ("%", "pps", "bps")
    pub fn unit_suffix(&self) -> &'static str {
        match self {
            RateType::Percentage => "%",
            RateType::PacketsPerSecond => "pps",
            RateType::BitsPerSecond => "bps",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RateType {
    type Err = DropRateSearchError;

    /// Accepts either the long name or the unit suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" | "%" => Ok(RateType::Percentage),
            "packets_per_second" | "pps" => Ok(RateType::PacketsPerSecond),
            "bits_per_second" | "bps" => Ok(RateType::BitsPerSecond),
            other => Err(DropRateSearchError::ConfigError(format!(
                "rate_type unknown: {}",
                other
            ))),
        }
    }
}

/// 許容ロスの解釈 (フレーム数 / 送信フレームに対する割合)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossAcceptanceType {
    Frames,
    Percentage,
}

impl Default for LossAcceptanceType {
    fn default() -> Self {
        LossAcceptanceType::Frames
    }
}

impl LossAcceptanceType {
    pub fn label(&self) -> &'static str {
        match self {
            LossAcceptanceType::Frames => "frames",
            LossAcceptanceType::Percentage => "percentage",
        }
    }
}

impl fmt::Display for LossAcceptanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LossAcceptanceType {
    type Err = DropRateSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frames" => Ok(LossAcceptanceType::Frames),
            "percentage" => Ok(LossAcceptanceType::Percentage),
            other => Err(DropRateSearchError::ConfigError(format!(
                "loss_acceptance_type unknown: {}",
                other
            ))),
        }
    }
}

/// 同一レートでの複数試行結果の集約方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchResultType {
    BestOfN,
    WorstOfN,
}

impl Default for SearchResultType {
    fn default() -> Self {
        SearchResultType::BestOfN
    }
}

impl SearchResultType {
    pub fn label(&self) -> &'static str {
        match self {
            SearchResultType::BestOfN => "best_of_n",
            SearchResultType::WorstOfN => "worst_of_n",
        }
    }
}

impl fmt::Display for SearchResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchResultType {
    type Err = DropRateSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best_of_n" => Ok(SearchResultType::BestOfN),
            "worst_of_n" => Ok(SearchResultType::WorstOfN),
            other => Err(DropRateSearchError::ConfigError(format!(
                "search_type unknown: {}",
                other
            ))),
        }
    }
}

/// 探索設定
///
/// Mutated only through the `set_*` methods, each of which validates its
/// argument and leaves the configuration untouched on error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfiguration {
    duration: u64,
    rate_start: f64,
    rate_linear_step: f64,
    search_linear_direction: SearchDirection,
    rate_max: f64,
    rate_min: f64,
    rate_type: RateType,
    loss_acceptance: f64,
    loss_acceptance_type: LossAcceptanceType,
    frame_size: String,
    binary_convergence_threshold: f64,
    max_attempts: u32,
    search_result_type: SearchResultType,
}

impl Default for SearchConfiguration {
    fn default() -> Self {
        Self {
            duration: 60,
            rate_start: 100.0,
            rate_linear_step: 10.0,
            search_linear_direction: SearchDirection::default(),
            rate_max: 100.0,
            rate_min: 1.0,
            rate_type: RateType::default(),
            loss_acceptance: 0.0,
            loss_acceptance_type: LossAcceptanceType::default(),
            frame_size: "64".to_string(),
            binary_convergence_threshold: 5000.0,
            max_attempts: 1,
            search_result_type: SearchResultType::default(),
        }
    }
}

fn config_error(msg: &str) -> DropRateSearchError {
    DropRateSearchError::ConfigError(msg.to_string())
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl SearchConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// 探索範囲 [min_rate, max_rate] を設定する
    pub fn set_search_rate_boundaries(
        &mut self,
        max_rate: f64,
        min_rate: f64,
    ) -> Result<(), DropRateSearchError> {
        if !is_positive(min_rate) {
            return Err(config_error("min_rate must be higher than 0"));
        }
        if !max_rate.is_finite() || min_rate > max_rate {
            return Err(config_error("min_rate must be lower than max_rate"));
        }
        self.rate_max = max_rate;
        self.rate_min = min_rate;
        Ok(())
    }

    /// 線形探索の開始レートを設定する。範囲内かどうかは探索開始時に検査する。
    pub fn set_search_rate_start(&mut self, rate_start: f64) -> Result<(), DropRateSearchError> {
        if !is_positive(rate_start) {
            return Err(config_error("rate_start must be greater than 0"));
        }
        self.rate_start = rate_start;
        Ok(())
    }

    pub fn set_loss_acceptance(&mut self, loss_acceptance: f64) -> Result<(), DropRateSearchError> {
        if loss_acceptance.is_nan() || loss_acceptance < 0.0 || loss_acceptance.is_infinite() {
            return Err(config_error("Loss acceptance must be higher or equal 0"));
        }
        self.loss_acceptance = loss_acceptance;
        Ok(())
    }

    pub fn set_loss_acceptance_type_percentage(&mut self) {
        self.loss_acceptance_type = LossAcceptanceType::Percentage;
    }

    pub fn set_loss_acceptance_type_frames(&mut self) {
        self.loss_acceptance_type = LossAcceptanceType::Frames;
    }

    pub fn set_loss_acceptance_type(&mut self, loss_acceptance_type: LossAcceptanceType) {
        self.loss_acceptance_type = loss_acceptance_type;
    }

    pub fn set_search_linear_step(&mut self, step_rate: f64) -> Result<(), DropRateSearchError> {
        if !is_positive(step_rate) {
            return Err(config_error("linear step must be greater than 0"));
        }
        self.rate_linear_step = step_rate;
        Ok(())
    }

    /// BOTTOM_UP is accepted here and rejected when a linear search runs.
    pub fn set_search_linear_direction(&mut self, direction: SearchDirection) {
        self.search_linear_direction = direction;
    }

    pub fn set_search_rate_type_percentage(&mut self) {
        self.rate_type = RateType::Percentage;
    }

    pub fn set_search_rate_type_bps(&mut self) {
        self.rate_type = RateType::BitsPerSecond;
    }

    pub fn set_search_rate_type_pps(&mut self) {
        self.rate_type = RateType::PacketsPerSecond;
    }

    pub fn set_search_rate_type(&mut self, rate_type: RateType) {
        self.rate_type = rate_type;
    }

    pub fn set_search_frame_size(
        &mut self,
        frame_size: impl Into<String>,
    ) -> Result<(), DropRateSearchError> {
        let frame_size = frame_size.into();
        if frame_size.trim().is_empty() {
            return Err(config_error("frame_size must not be empty"));
        }
        self.frame_size = frame_size;
        Ok(())
    }

    /// 1回の試行の長さ（秒）
    pub fn set_duration(&mut self, duration: u64) -> Result<(), DropRateSearchError> {
        if duration == 0 {
            return Err(config_error("duration must be greater than 0"));
        }
        self.duration = duration;
        Ok(())
    }

    pub fn set_binary_convergence_threshold(
        &mut self,
        convergence: f64,
    ) -> Result<(), DropRateSearchError> {
        if !is_positive(convergence) {
            return Err(config_error(
                "binary convergence threshold must be greater than 0",
            ));
        }
        self.binary_convergence_threshold = convergence;
        Ok(())
    }

    /// 1レートあたりの試行回数
    pub fn set_max_attempts(&mut self, max_attempts: u32) -> Result<(), DropRateSearchError> {
        if max_attempts == 0 {
            return Err(config_error("Max attempt must be greater than zero"));
        }
        self.max_attempts = max_attempts;
        Ok(())
    }

    pub fn set_search_result_type_best_of_n(&mut self) {
        self.search_result_type = SearchResultType::BestOfN;
    }

    pub fn set_search_result_type_worst_of_n(&mut self) {
        self.search_result_type = SearchResultType::WorstOfN;
    }

    pub fn set_search_result_type(&mut self, search_result_type: SearchResultType) {
        self.search_result_type = search_result_type;
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn rate_start(&self) -> f64 {
        self.rate_start
    }

    pub fn rate_linear_step(&self) -> f64 {
        self.rate_linear_step
    }

    pub fn search_linear_direction(&self) -> SearchDirection {
        self.search_linear_direction
    }

    pub fn rate_max(&self) -> f64 {
        self.rate_max
    }

    pub fn rate_min(&self) -> f64 {
        self.rate_min
    }

    pub fn rate_type(&self) -> RateType {
        self.rate_type
    }

    /// 単位文字列 ("%", "bps", "pps")
    pub fn rate_type_str(&self) -> &'static str {
        self.rate_type.unit_suffix()
    }

    pub fn loss_acceptance(&self) -> f64 {
        self.loss_acceptance
    }

    pub fn loss_acceptance_type(&self) -> LossAcceptanceType {
        self.loss_acceptance_type
    }

    pub fn loss_acceptance_type_is_percentage(&self) -> bool {
        self.loss_acceptance_type == LossAcceptanceType::Percentage
    }

    pub fn frame_size(&self) -> &str {
        &self.frame_size
    }

    pub fn binary_convergence_threshold(&self) -> f64 {
        self.binary_convergence_threshold
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn search_result_type(&self) -> SearchResultType {
        self.search_result_type
    }

    /// rate が [rate_min, rate_max] に含まれるか
    pub fn contains_rate(&self, rate: f64) -> bool {
        self.rate_min <= rate && rate <= self.rate_max
    }

    /// 設定値のバリデーション
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.duration == 0 {
            errors.push("duration must be greater than 0".to_string());
        }
        if !is_positive(self.rate_min) {
            errors.push("rate_min must be greater than 0".to_string());
        }
        if !self.rate_max.is_finite() || self.rate_min > self.rate_max {
            errors.push("rate_min must be <= rate_max".to_string());
        }
        if !is_positive(self.rate_start) {
            errors.push("rate_start must be greater than 0".to_string());
        }
        if !is_positive(self.rate_linear_step) {
            errors.push("rate_linear_step must be greater than 0".to_string());
        }
        if self.loss_acceptance.is_nan()
            || self.loss_acceptance < 0.0
            || self.loss_acceptance.is_infinite()
        {
            errors.push("loss_acceptance must be >= 0".to_string());
        }
        if self.frame_size.trim().is_empty() {
            errors.push("frame_size must not be empty".to_string());
        }
        if !is_positive(self.binary_convergence_threshold) {
            errors.push("binary_convergence_threshold must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            errors.push("max_attempts must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// JSON文字列から設定を読み込み、バリデーションを実行する
pub fn load_from_str(json: &str) -> Result<SearchConfiguration, DropRateSearchError> {
    let config: SearchConfiguration = serde_json::from_str(json)
        .map_err(|e| DropRateSearchError::ConfigError(format!("JSON parse error: {}", e)))?;

    config.validate().map_err(|errors| {
        DropRateSearchError::ConfigError(format!("Validation errors: {}", errors.join("; ")))
    })?;

    Ok(config)
}

/// JSONファイルから設定を読み込み、バリデーションを実行する
pub fn load_from_file(path: &Path) -> Result<SearchConfiguration, DropRateSearchError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DropRateSearchError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    load_from_str(&content)
}
