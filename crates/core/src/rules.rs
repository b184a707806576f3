/// Tunable study and gamification constants.
///
/// The quiz restart threshold and the mastery threshold are two separate
/// numbers on purpose; keep them independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyRules {
    /// Minimum quiz percentage that marks a topic's quiz as mastered.
    pub mastery_threshold_percent: u8,
    /// A submitted quiz may be restarted only at or below this percentage.
    pub restart_threshold_percent: u8,
    /// XP for finishing any guided step via "continue".
    pub xp_guided_step: u32,
    /// One-time bonus for reaching the end of the curriculum.
    pub xp_curriculum_complete: u32,
    pub xp_flashcard_mastered: u32,
    pub xp_concept_viewed: u32,
    pub xp_topic_viewed: u32,
    pub xp_topic_completed: u32,
    /// Upper bound on questions drawn for a practice test.
    pub practice_test_questions: usize,
    pub practice_test_pass_percent: u8,
    /// Time limit shown for a practice test.
    pub practice_test_time_limit_secs: u32,
}

impl Default for StudyRules {
    fn default() -> Self {
        Self {
            mastery_threshold_percent: 70,
            restart_threshold_percent: 66,
            xp_guided_step: 5,
            xp_curriculum_complete: 100,
            xp_flashcard_mastered: 2,
            xp_concept_viewed: 3,
            xp_topic_viewed: 2,
            xp_topic_completed: 10,
            practice_test_questions: 75,
            practice_test_pass_percent: 70,
            practice_test_time_limit_secs: 120 * 60,
        }
    }
}

impl StudyRules {
    #[must_use]
    pub fn is_mastery(&self, percent: u8) -> bool {
        percent >= self.mastery_threshold_percent
    }

    #[must_use]
    pub fn allows_restart(&self, percent: u8) -> bool {
        percent <= self.restart_threshold_percent
    }

    /// XP for submitting a guided quiz: one point per ten percent, at least one.
    #[must_use]
    pub fn quiz_completion_xp(&self, percent: u8) -> u32 {
        let tenths = (u32::from(percent) + 5) / 10;
        tenths.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_distinct() {
        let rules = StudyRules::default();
        // 67..=69 neither restarts nor masters
        for percent in 67..=69 {
            assert!(!rules.allows_restart(percent));
            assert!(!rules.is_mastery(percent));
        }
        assert!(rules.allows_restart(66));
        assert!(rules.is_mastery(70));
    }

    #[test]
    fn quiz_completion_xp_rounds_and_has_floor() {
        let rules = StudyRules::default();
        assert_eq!(rules.quiz_completion_xp(0), 1);
        assert_eq!(rules.quiz_completion_xp(4), 1);
        assert_eq!(rules.quiz_completion_xp(67), 7);
        assert_eq!(rules.quiz_completion_xp(65), 7);
        assert_eq!(rules.quiz_completion_xp(100), 10);
    }
}
