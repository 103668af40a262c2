use serde::{Serialize, Serializer};

/// One user's aggregate inside a leaderboard window, as produced by the
/// grouped query (already ordered by total score desc, total correct desc,
/// and capped at the candidate limit).
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct WindowRow {
    pub(crate) user_id: String,
    pub(crate) name: String,
    pub(crate) profile_image: Option<String>,
    pub(crate) total_score: f64,
    pub(crate) total_correct: i64,
    pub(crate) exams_taken: i64,
}

/// Movement relative to the previous window: a signed position delta, or
/// "new" for users with no previous-window rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RankMovement {
    New,
    Moved(i64),
}

impl Serialize for RankMovement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RankMovement::New => serializer.serialize_str("new"),
            RankMovement::Moved(delta) => serializer.serialize_i64(*delta),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RankedEntry {
    pub(crate) user_id: String,
    pub(crate) name: String,
    pub(crate) avatar: Option<String>,
    pub(crate) score: f64,
    pub(crate) exams: i64,
    pub(crate) rank: i64,
    pub(crate) rank_change: RankMovement,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ViewerStanding {
    pub(crate) position: i64,
    pub(crate) score: f64,
    pub(crate) rank_change: RankMovement,
    pub(crate) percentile: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct Standings {
    pub(crate) top_three: Vec<RankedEntry>,
    pub(crate) rest: Vec<RankedEntry>,
    pub(crate) user_rank: Option<ViewerStanding>,
}

/// How many entries beyond the podium are returned.
const REST_CAP: usize = 47;

/// Joins the current window's ranking against the previous window's to
/// attach movement, then partitions into podium, remainder and the viewer's
/// own standing. Positions are 1-based list positions within each window.
pub(crate) fn build_standings(
    current: Vec<WindowRow>,
    previous: &[WindowRow],
    viewer_id: Option<&str>,
) -> Standings {
    let total_ranked = current.len() as i64;

    let previous_position = |user_id: &str| -> Option<i64> {
        previous.iter().position(|row| row.user_id == user_id).map(|idx| idx as i64 + 1)
    };

    let mut entries = Vec::with_capacity(current.len());
    let mut user_rank = None;

    for (index, row) in current.into_iter().enumerate() {
        let rank = index as i64 + 1;
        let rank_change = match previous_position(&row.user_id) {
            Some(previous_rank) => RankMovement::Moved(previous_rank - rank),
            None => RankMovement::New,
        };

        if viewer_id == Some(row.user_id.as_str()) {
            let percentile =
                (((total_ranked - index as i64) as f64 / total_ranked as f64) * 100.0).round()
                    as i64;
            user_rank = Some(ViewerStanding {
                position: rank,
                score: row.total_score,
                rank_change,
                percentile,
            });
        }

        entries.push(RankedEntry {
            user_id: row.user_id,
            name: row.name,
            avatar: row.profile_image,
            score: row.total_score,
            exams: row.exams_taken,
            rank,
            rank_change,
        });
    }

    let rest = if entries.len() > 3 {
        entries.split_off(3).into_iter().take(REST_CAP).collect()
    } else {
        Vec::new()
    };

    Standings { top_three: entries, rest, user_rank }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: &str, score: f64, correct: i64, exams: i64) -> WindowRow {
        WindowRow {
            user_id: user_id.to_string(),
            name: format!("User {user_id}"),
            profile_image: None,
            total_score: score,
            total_correct: correct,
            exams_taken: exams,
        }
    }

    fn rows(specs: &[(&str, f64)]) -> Vec<WindowRow> {
        specs.iter().map(|(id, score)| row(id, *score, *score as i64, 1)).collect()
    }

    #[test]
    fn partitions_podium_and_rest() {
        let current = rows(&[("a", 50.0), ("b", 40.0), ("c", 30.0), ("d", 20.0), ("e", 10.0)]);
        let standings = build_standings(current, &[], None);

        assert_eq!(standings.top_three.len(), 3);
        assert_eq!(standings.rest.len(), 2);
        assert_eq!(standings.top_three[0].user_id, "a");
        assert_eq!(standings.rest[0].user_id, "d");
        assert_eq!(standings.rest[0].rank, 4);
    }

    #[test]
    fn rest_is_capped() {
        let current: Vec<WindowRow> =
            (0..80).map(|i| row(&format!("u{i}"), (100 - i) as f64, 1, 1)).collect();
        let standings = build_standings(current, &[], None);

        assert_eq!(standings.top_three.len(), 3);
        assert_eq!(standings.rest.len(), 47);
    }

    #[test]
    fn positive_delta_means_moved_up() {
        let previous = rows(&[("a", 50.0), ("b", 40.0), ("c", 30.0)]);
        // c overtakes both others this window
        let current = rows(&[("c", 90.0), ("a", 50.0), ("b", 40.0)]);
        let standings = build_standings(current, &previous, None);

        assert_eq!(standings.top_three[0].user_id, "c");
        assert_eq!(standings.top_three[0].rank_change, RankMovement::Moved(2));
        assert_eq!(standings.top_three[1].rank_change, RankMovement::Moved(-1));
    }

    #[test]
    fn new_entrant_is_flagged_not_numeric() {
        let previous = rows(&[("a", 50.0)]);
        let current = rows(&[("a", 60.0), ("fresh", 10.0)]);
        let standings = build_standings(current, &previous, None);

        assert_eq!(standings.top_three[1].user_id, "fresh");
        assert_eq!(standings.top_three[1].rank_change, RankMovement::New);
    }

    #[test]
    fn previous_window_only_users_never_appear() {
        let previous = rows(&[("gone", 99.0), ("a", 50.0)]);
        let current = rows(&[("a", 60.0)]);
        let standings = build_standings(current, &previous, None);

        assert_eq!(standings.top_three.len(), 1);
        assert!(standings.rest.is_empty());
        assert_eq!(standings.top_three[0].user_id, "a");
        // a was second last window, first now
        assert_eq!(standings.top_three[0].rank_change, RankMovement::Moved(1));
    }

    #[test]
    fn viewer_rank_includes_percentile() {
        let current = rows(&[("a", 50.0), ("b", 40.0), ("c", 30.0), ("viewer", 20.0)]);
        let standings = build_standings(current, &[], Some("viewer"));

        let viewer = standings.user_rank.expect("viewer present");
        assert_eq!(viewer.position, 4);
        assert_eq!(viewer.score, 20.0);
        assert_eq!(viewer.rank_change, RankMovement::New);
        // (4 - 3) / 4 * 100 = 25
        assert_eq!(viewer.percentile, 25);
    }

    #[test]
    fn absent_viewer_yields_no_user_rank() {
        let current = rows(&[("a", 50.0)]);
        let standings = build_standings(current, &[], Some("nobody"));

        assert!(standings.user_rank.is_none());
    }

    #[test]
    fn movement_serializes_as_number_or_new() {
        assert_eq!(serde_json::to_value(RankMovement::Moved(3)).unwrap(), serde_json::json!(3));
        assert_eq!(serde_json::to_value(RankMovement::New).unwrap(), serde_json::json!("new"));
    }
}
