/// Score and correct-answer count of one result, the two fields the
/// per-exam order is defined over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RankKey {
    pub(crate) score: f64,
    pub(crate) correct_answers: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Standing {
    pub(crate) rank: i64,
    pub(crate) percentile: i64,
}

impl RankKey {
    fn beats(&self, other: &RankKey) -> bool {
        self.score > other.score
            || (self.score == other.score && self.correct_answers > other.correct_answers)
    }
}

/// Competition ranking over every result of one exam: rank is one plus the
/// number of strictly better results, so fully tied results share a rank and
/// the next distinct result skips past them.
pub(crate) fn rank_of(participants: &[RankKey], target: RankKey) -> Standing {
    let total = participants.len() as i64;
    let better = participants.iter().filter(|entry| entry.beats(&target)).count() as i64;
    let rank = better + 1;

    let percentile = if total > 0 {
        (((total - rank) as f64 / total as f64) * 100.0).round() as i64
    } else {
        // defensive: an exam nobody finished yet
        100
    };

    Standing { rank, percentile }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(score: f64, correct: i32) -> RankKey {
        RankKey { score, correct_answers: correct }
    }

    #[test]
    fn higher_score_outranks() {
        let all = [key(9.0, 9), key(7.0, 7), key(5.0, 5)];

        assert_eq!(rank_of(&all, all[0]).rank, 1);
        assert_eq!(rank_of(&all, all[1]).rank, 2);
        assert_eq!(rank_of(&all, all[2]).rank, 3);
    }

    #[test]
    fn equal_score_breaks_tie_on_correct_answers() {
        // same score, but the second entry got there with fewer correct
        // answers (more negative marking recovered elsewhere)
        let all = [key(5.0, 6), key(5.0, 5)];

        assert_eq!(rank_of(&all, all[0]).rank, 1);
        assert_eq!(rank_of(&all, all[1]).rank, 2);
    }

    #[test]
    fn fully_tied_results_share_a_rank_and_the_next_skips() {
        let all = [key(5.0, 5), key(5.0, 5), key(5.0, 5), key(3.0, 3)];

        assert_eq!(rank_of(&all, all[0]).rank, 1);
        assert_eq!(rank_of(&all, all[1]).rank, 1);
        assert_eq!(rank_of(&all, all[2]).rank, 1);
        // three tied firsts, so the next participant is rank 4, not 2
        assert_eq!(rank_of(&all, all[3]).rank, 4);
    }

    #[test]
    fn percentile_of_top_and_bottom() {
        let all = [key(10.0, 10), key(8.0, 8), key(6.0, 6), key(4.0, 4)];

        let top = rank_of(&all, all[0]);
        assert_eq!(top.percentile, 75);

        let bottom = rank_of(&all, all[3]);
        assert_eq!(bottom.percentile, 0);
    }

    #[test]
    fn zero_participants_yields_percentile_100() {
        let standing = rank_of(&[], key(0.0, 0));

        assert_eq!(standing.rank, 1);
        assert_eq!(standing.percentile, 100);
    }

    #[test]
    fn sole_participant_is_rank_one() {
        let all = [key(2.0, 2)];
        let standing = rank_of(&all, all[0]);

        assert_eq!(standing.rank, 1);
        assert_eq!(standing.percentile, 0);
    }
}
