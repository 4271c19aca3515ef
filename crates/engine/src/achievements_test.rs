#[cfg(test)]
mod tests {
    use crate::achievements::qualifying;
    use chrono::Utc;
    use common::models::{Achievement, AchievementKind, ProgressStats};
    use uuid::Uuid;

    fn achievement(kind: AchievementKind, requirement: i32, phase_id: Option<Uuid>) -> Achievement {
        Achievement {
            id: Uuid::new_v4(),
            title: format!("{:?} {}", kind, requirement),
            description: String::new(),
            icon: None,
            kind,
            requirement,
            points_reward: 10,
            phase_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn stats() -> ProgressStats {
        ProgressStats {
            level: 3,
            total_points: 250,
            games_completed: 7,
            missions_completed: 4,
            phases_completed: 1,
            completed_phase_ids: vec![],
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let defs = vec![
            achievement(AchievementKind::Level, 3, None),
            achievement(AchievementKind::Points, 250, None),
            achievement(AchievementKind::Games, 7, None),
            achievement(AchievementKind::Mission, 4, None),
        ];
        assert_eq!(qualifying(&stats(), &defs).len(), 4);
    }

    #[test]
    fn unmet_thresholds_do_not_qualify() {
        let defs = vec![
            achievement(AchievementKind::Level, 4, None),
            achievement(AchievementKind::Points, 251, None),
            achievement(AchievementKind::Games, 8, None),
            achievement(AchievementKind::Mission, 5, None),
        ];
        assert!(qualifying(&stats(), &defs).is_empty());
    }

    #[test]
    fn phase_tied_achievement_needs_that_exact_phase() {
        let phase = Uuid::new_v4();
        let other = Uuid::new_v4();
        let defs = vec![achievement(AchievementKind::Phase, 1, Some(phase))];

        let mut s = stats();
        s.completed_phase_ids = vec![other];
        assert!(qualifying(&s, &defs).is_empty());

        s.completed_phase_ids.push(phase);
        assert_eq!(qualifying(&s, &defs).len(), 1);
    }

    #[test]
    fn untied_phase_achievement_counts_phases() {
        let defs = vec![
            achievement(AchievementKind::Phase, 1, None),
            achievement(AchievementKind::Phase, 2, None),
        ];
        let hits = qualifying(&stats(), &defs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].requirement, 1);
    }

    #[test]
    fn special_achievements_never_auto_unlock() {
        let defs = vec![achievement(AchievementKind::Special, 0, None)];
        assert!(qualifying(&stats(), &defs).is_empty());
    }

    #[test]
    fn fresh_user_qualifies_for_level_one_only() {
        let s = ProgressStats {
            level: 1,
            ..Default::default()
        };
        let defs = vec![
            achievement(AchievementKind::Level, 1, None),
            achievement(AchievementKind::Points, 1, None),
            achievement(AchievementKind::Games, 1, None),
        ];
        let hits = qualifying(&s, &defs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, AchievementKind::Level);
    }
}
