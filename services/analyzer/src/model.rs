use serde::{Deserialize, Serialize};

/// Structured analysis returned by the analysis service.
///
/// Only ever built from a response that passed contract validation, and
/// replaced wholesale on refresh. List order is the producer's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary_stats: SummaryStats,
    pub crime_analysis: CrimeAnalysis,
    pub call_analysis: CallAnalysis,
    pub location_analysis: LocationAnalysis,
    pub device_analysis: DeviceAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_calls: f64,
    pub total_duration_sec: f64,
    pub total_duration_formatted: String,
    pub unique_imeis: f64,
    pub unique_imsis: f64,
    pub roaming_calls: f64,
    pub date_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeAnalysis {
    pub top_crimes: Vec<NameCountPercent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalysis {
    pub top_b_parties: Vec<NameCount>,
    pub call_type_distribution: Vec<NameValue>,
    pub calls_per_day: Vec<DateCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAnalysis {
    pub calls_by_city: Vec<NameCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAnalysis {
    pub top_imeis: Vec<NameCount>,
    pub imei_manufacturer_distribution: Vec<NameValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCountPercent {
    pub name: String,
    pub count: f64,
    /// 0-100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: String,
    pub count: f64,
}
