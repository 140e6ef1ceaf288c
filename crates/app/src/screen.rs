//! Screen state — the data an app hands to the rendering toolkit.
//!
//! The core owns no pixels. Each app keeps one [`Gauge`] per setting (an
//! arc plus a label) and flips visibility so only the active setting's
//! gauge shows. Rendering reads a [`Frame`] snapshot of that data.

use knobhub_domain::id::AppId;
use knobhub_domain::profile::MotorProfile;
use knobhub_domain::setting::SettingKind;
use knobhub_domain::value::SettingValue;

/// Angular span of a gauge arc, in degrees.
pub const ARC_SPAN: u16 = 270;

/// Arc value and label for one setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gauge {
    pub setting: SettingKind,
    pub label: String,
    /// Arc fill, `0..=ARC_SPAN`.
    pub arc_value: u16,
    pub hidden: bool,
}

impl Gauge {
    fn new(value: &SettingValue, hidden: bool) -> Self {
        Self {
            setting: value.setting(),
            label: value.label(),
            arc_value: arc_value(value),
            hidden,
        }
    }
}

/// Arc fill for `value`, proportional to its position in the domain.
#[must_use]
pub fn arc_value(value: &SettingValue) -> u16 {
    let max = value.spec().max_position();
    if max <= 0 {
        return 0;
    }
    let fill = i64::from(value.position()) * i64::from(ARC_SPAN) / i64::from(max);
    u16::try_from(fill).unwrap_or(ARC_SPAN)
}

/// All gauges of one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    gauges: Vec<Gauge>,
}

impl Screen {
    /// Build one gauge per value, showing only `active`.
    #[must_use]
    pub fn new(values: &[SettingValue], active: usize) -> Self {
        let gauges = values
            .iter()
            .enumerate()
            .map(|(index, value)| Gauge::new(value, index != active))
            .collect();
        Self { gauges }
    }

    /// Refresh the gauge at `index` from `value`.
    pub fn update(&mut self, index: usize, value: &SettingValue) {
        if let Some(gauge) = self.gauges.get_mut(index) {
            gauge.label = value.label();
            gauge.arc_value = arc_value(value);
        }
    }

    /// Show the gauge at `index` and hide every other one.
    pub fn show(&mut self, index: usize) {
        for (i, gauge) in self.gauges.iter_mut().enumerate() {
            gauge.hidden = i != index;
        }
    }

    /// The gauge currently shown.
    #[must_use]
    pub fn visible(&self) -> Option<&Gauge> {
        self.gauges.iter().find(|gauge| !gauge.hidden)
    }

    #[must_use]
    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }
}

/// Snapshot of what the active app shows, taken under the app's lock.
///
/// `value`, `gauge` and `profile` always belong to the same setting.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub app_id: Option<AppId>,
    pub friendly_name: String,
    pub setting: Option<SettingKind>,
    pub value: Option<SettingValue>,
    pub gauge: Option<Gauge>,
    pub profile: MotorProfile,
}

impl Frame {
    /// What renders while no app is active.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            app_id: None,
            friendly_name: String::new(),
            setting: None,
            value: None,
            gauge: None,
            profile: MotorProfile::neutral(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.app_id.is_none()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}
