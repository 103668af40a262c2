use serde::Serialize;

/// Exams needed in the last seven days to hit the dashboard goal.
pub(crate) const WEEKLY_GOAL: i64 = 5;

/// Fraction of total marks required to count an attempt as passed.
pub(crate) const PASS_THRESHOLD: f64 = 0.4;

/// One scored attempt joined with its exam's subject.
#[derive(Debug, Clone)]
pub(crate) struct ScoredAttempt {
    pub(crate) subject: String,
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubjectAverage {
    pub(crate) subject: String,
    pub(crate) average: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Badge {
    pub(crate) icon: &'static str,
    pub(crate) name: &'static str,
    pub(crate) color: &'static str,
    pub(crate) desc: &'static str,
}

impl ScoredAttempt {
    fn percentage(&self) -> f64 {
        if self.total_marks > 0 {
            self.score / f64::from(self.total_marks) * 100.0
        } else {
            0.0
        }
    }
}

/// Average percentage per subject, in first-seen order.
pub(crate) fn subject_averages(attempts: &[ScoredAttempt]) -> Vec<SubjectAverage> {
    let mut buckets: Vec<(String, f64, i64)> = Vec::new();

    for attempt in attempts {
        let pct = attempt.percentage();
        match buckets.iter_mut().find(|(subject, _, _)| *subject == attempt.subject) {
            Some((_, total, count)) => {
                *total += pct;
                *count += 1;
            }
            None => buckets.push((attempt.subject.clone(), pct, 1)),
        }
    }

    buckets
        .into_iter()
        .map(|(subject, total, count)| SubjectAverage {
            subject,
            average: (total / count as f64).round() as i64,
        })
        .collect()
}

/// Subject with the lowest average, used to pick exam recommendations.
pub(crate) fn weakest_subject(averages: &[SubjectAverage]) -> Option<&str> {
    averages
        .iter()
        .min_by_key(|entry| entry.average)
        .map(|entry| entry.subject.as_str())
}

pub(crate) fn earned_badges(attempts: &[ScoredAttempt], exams_this_week: i64) -> Vec<Badge> {
    let mut badges = Vec::new();

    if !attempts.is_empty() {
        badges.push(Badge {
            icon: "award",
            name: "First Step",
            color: "blue",
            desc: "Completed 1st Exam",
        });
    }
    if attempts.len() >= 5 {
        badges.push(Badge { icon: "star", name: "Dedicated", color: "yellow", desc: "Completed 5 Exams" });
    }
    if attempts.iter().any(|attempt| attempt.percentage() >= 90.0) {
        badges.push(Badge { icon: "zap", name: "High Flyer", color: "purple", desc: "Scored 90%+" });
    }
    if exams_this_week >= WEEKLY_GOAL {
        badges.push(Badge { icon: "flame", name: "On Fire", color: "red", desc: "Hit Weekly Goal" });
    }

    badges
}

#[derive(Debug, Clone)]
pub(crate) struct StudentRecord {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StudentAttempt {
    pub(crate) user_id: String,
    pub(crate) subject: String,
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StudentSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) total_exams: i64,
    pub(crate) avg_score: i64,
    pub(crate) strongest_subject: String,
    pub(crate) weakest_subject: String,
}

/// Per-student performance rollup for the admin analytics view, best
/// average first. Students without attempts still appear, with N/A
/// subject extremes.
pub(crate) fn student_analytics(
    students: Vec<StudentRecord>,
    attempts: &[StudentAttempt],
) -> Vec<StudentSummary> {
    let mut summaries: Vec<StudentSummary> = students
        .into_iter()
        .map(|student| {
            let own: Vec<ScoredAttempt> = attempts
                .iter()
                .filter(|attempt| attempt.user_id == student.id)
                .map(|attempt| ScoredAttempt {
                    subject: attempt.subject.clone(),
                    score: attempt.score,
                    total_marks: attempt.total_marks,
                })
                .collect();

            let total_exams = own.len() as i64;
            let avg_score = if total_exams > 0 {
                (own.iter().map(ScoredAttempt::percentage).sum::<f64>() / total_exams as f64)
                    .round() as i64
            } else {
                0
            };

            let averages = subject_averages(&own);
            let strongest = averages
                .iter()
                .max_by_key(|entry| entry.average)
                .map(|entry| entry.subject.clone())
                .unwrap_or_else(|| "N/A".to_string());
            let weakest = averages
                .iter()
                .min_by_key(|entry| entry.average)
                .map(|entry| entry.subject.clone())
                .unwrap_or_else(|| "N/A".to_string());

            StudentSummary {
                id: student.id,
                name: student.name,
                email: student.email,
                total_exams,
                avg_score,
                strongest_subject: strongest,
                weakest_subject: weakest,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.avg_score.cmp(&a.avg_score));
    summaries
}
