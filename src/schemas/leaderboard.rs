use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timeframe {
    Weekly,
    AllTime,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardQuery {
    #[serde(default)]
    pub(crate) timeframe: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
}

impl LeaderboardQuery {
    /// Anything other than "weekly" falls back to the all-time board.
    pub(crate) fn timeframe(&self) -> Timeframe {
        match self.timeframe.as_deref() {
            Some("weekly") => Timeframe::Weekly,
            _ => Timeframe::AllTime,
        }
    }

    /// "all" and empty both mean no subject restriction.
    pub(crate) fn subject_filter(&self) -> Option<&str> {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty() && !subject.eq_ignore_ascii_case("all"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(timeframe: Option<&str>, subject: Option<&str>) -> LeaderboardQuery {
        LeaderboardQuery {
            timeframe: timeframe.map(str::to_string),
            subject: subject.map(str::to_string),
        }
    }

    #[test]
    fn weekly_is_the_only_windowed_timeframe() {
        assert_eq!(query(Some("weekly"), None).timeframe(), Timeframe::Weekly);
        assert_eq!(query(Some("monthly"), None).timeframe(), Timeframe::AllTime);
        assert_eq!(query(None, None).timeframe(), Timeframe::AllTime);
    }

    #[test]
    fn subject_all_means_unfiltered() {
        assert_eq!(query(None, Some("all")).subject_filter(), None);
        assert_eq!(query(None, Some("All")).subject_filter(), None);
        assert_eq!(query(None, Some(" ")).subject_filter(), None);
        assert_eq!(query(None, Some("Physics")).subject_filter(), Some("Physics"));
    }
}
