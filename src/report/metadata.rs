//! Report-level metadata captured from the `<Result>` and `<Build>` tags.

use chrono::{DateTime, TimeZone, Utc};

/// Suite and device information from the report header.
///
/// Every field is optional: a field stays `None` when the source never
/// carried the corresponding attribute. Fields are populated at most once
/// per report, first occurrence wins, so a stray repeated `<Build>` tag
/// cannot overwrite earlier values.
///
/// `start_time` and `end_time` hold the raw attribute strings, which in
/// suite reports are milliseconds since the Unix epoch. Use
/// [`start_datetime`] / [`end_datetime`] for parsed values.
///
/// [`start_datetime`]: ReportMetadata::start_datetime
/// [`end_datetime`]: ReportMetadata::end_datetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportMetadata {
    /// Suite name, e.g. `CTS` (`suite_name`)
    pub test_suite_name: Option<String>,
    /// Suite release version, e.g. `9.0_r10` (`suite_version`)
    pub suite_version: Option<String>,
    /// Test plan the run executed, e.g. `cts` (`suite_plan`)
    pub suite_plan: Option<String>,
    /// Build number of the suite tooling itself (`suite_build_number`)
    pub suite_build_number: Option<String>,
    /// Host machine the runner executed on (`host_name`)
    pub host_name: Option<String>,
    /// Run start, milliseconds since the Unix epoch (`start`)
    pub start_time: Option<String>,
    /// Run end, milliseconds since the Unix epoch (`end`)
    pub end_time: Option<String>,
    /// Full fingerprint of the device build (`build_fingerprint`)
    pub device_fingerprint: Option<String>,
    /// Device build ID, e.g. `PQ1A.181105.017` (`build_id`)
    pub build_id: Option<String>,
    /// Device product name (`build_product`)
    pub build_product: Option<String>,
    /// Device model name (`build_model`)
    pub build_model: Option<String>,
    /// Build variant, e.g. `user` or `userdebug` (`build_type`)
    pub build_type: Option<String>,
    /// Security patch level, e.g. `2018-11-05` (`build_version_security_patch`)
    pub security_patch: Option<String>,
    /// Platform release version, e.g. `9` (`build_version_release`)
    pub android_version: Option<String>,
}

impl ReportMetadata {
    /// Creates metadata with no fields populated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no field was populated at all.
    pub fn is_empty(&self) -> bool {
        [
            &self.test_suite_name,
            &self.suite_version,
            &self.suite_plan,
            &self.suite_build_number,
            &self.host_name,
            &self.start_time,
            &self.end_time,
            &self.device_fingerprint,
            &self.build_id,
            &self.build_product,
            &self.build_model,
            &self.build_type,
            &self.security_patch,
            &self.android_version,
        ]
        .iter()
        .all(|field| field.is_none())
    }

    /// Run start as a UTC datetime, when `start_time` parses as epoch
    /// milliseconds.
    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        parse_epoch_millis(self.start_time.as_deref())
    }

    /// Run end as a UTC datetime, when `end_time` parses as epoch
    /// milliseconds.
    pub fn end_datetime(&self) -> Option<DateTime<Utc>> {
        parse_epoch_millis(self.end_time.as_deref())
    }
}

fn parse_epoch_millis(value: Option<&str>) -> Option<DateTime<Utc>> {
    let millis = value?.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
