//! Response fixtures shared with downstream tests.

use serde_json::{json, Value};

/// Smallest response that satisfies the contract: zeros and empty lists.
pub fn minimal_response() -> Value {
    json!({
        "summaryStats": {
            "totalCalls": 0,
            "totalDurationSec": 0,
            "totalDurationFormatted": "00:00:00",
            "uniqueImeis": 0,
            "uniqueImsis": 0,
            "roamingCalls": 0,
            "dateRange": ""
        },
        "crimeAnalysis": { "topCrimes": [] },
        "callAnalysis": {
            "topBParties": [],
            "callTypeDistribution": [],
            "callsPerDay": []
        },
        "locationAnalysis": { "callsByCity": [] },
        "deviceAnalysis": {
            "topImeis": [],
            "imeiManufacturerDistribution": []
        }
    })
}

/// A populated response, `total_calls` set as given.
pub fn sample_response(total_calls: u64) -> Value {
    json!({
        "summaryStats": {
            "totalCalls": total_calls,
            "totalDurationSec": 3725,
            "totalDurationFormatted": "01:02:05",
            "uniqueImeis": 2,
            "uniqueImsis": 2,
            "roamingCalls": 1,
            "dateRange": "2024-01-01 to 2024-01-02"
        },
        "crimeAnalysis": {
            "topCrimes": [{ "name": "Fraud", "count": 2, "percentage": 66.7 }]
        },
        "callAnalysis": {
            "topBParties": [{ "name": "555-1234", "count": 2 }],
            "callTypeDistribution": [{ "name": "Outgoing", "value": 3 }],
            "callsPerDay": [
                { "date": "2024-01-01", "count": 2 },
                { "date": "2024-01-02", "count": 1 }
            ]
        },
        "locationAnalysis": { "callsByCity": [{ "name": "Pune", "count": 3 }] },
        "deviceAnalysis": {
            "topImeis": [{ "name": "356938035643809", "count": 2 }],
            "imeiManufacturerDistribution": [{ "name": "Samsung", "value": 2 }]
        }
    })
}
