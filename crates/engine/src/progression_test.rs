#[cfg(test)]
mod tests {
    use crate::progression::{level_for_experience, pass_threshold, unlock_flags};

    #[test]
    fn threshold_is_seventy_percent_rounded_up() {
        assert_eq!(pass_threshold(10), 7);
        assert_eq!(pass_threshold(11), 8); // 7.7 rounds up
        assert_eq!(pass_threshold(100), 70);
        assert_eq!(pass_threshold(1), 1);
        assert_eq!(pass_threshold(0), 0);
    }

    #[test]
    fn level_is_floor_of_thousandths_plus_one() {
        assert_eq!(level_for_experience(0), 1);
        assert_eq!(level_for_experience(999), 1);
        assert_eq!(level_for_experience(1000), 2);
        assert_eq!(level_for_experience(2500), 3);
    }

    #[test]
    fn mission_reward_crosses_level_boundary() {
        // 950 XP at level 1, a 100 XP mission lands at 1050 and level 2
        let before = 950;
        let after = before + 100;
        assert_eq!(level_for_experience(before), 1);
        assert_eq!(level_for_experience(after), 2);
    }

    #[test]
    fn level_never_decreases_across_grants() {
        let grants = [0i64, 10, 500, 499, 1, 2000, 1];
        let mut total = 0;
        let mut last_level = level_for_experience(total);
        for grant in grants {
            total += grant;
            let level = level_for_experience(total);
            assert!(level >= last_level);
            last_level = level;
        }
    }

    #[test]
    fn nothing_unlocks_before_the_video() {
        assert_eq!(unlock_flags(false, &[false, false]), vec![false, false]);
        assert_eq!(unlock_flags(false, &[true, true]), vec![false, false]);
    }

    #[test]
    fn first_item_unlocks_with_the_video() {
        assert_eq!(unlock_flags(true, &[false]), vec![true]);
    }

    #[test]
    fn items_unlock_one_behind_completion() {
        assert_eq!(
            unlock_flags(true, &[true, false, false]),
            vec![true, true, false]
        );
        assert_eq!(
            unlock_flags(true, &[true, true, false]),
            vec![true, true, true]
        );
    }

    #[test]
    fn unlock_looks_only_at_the_immediate_predecessor() {
        // Second item completed out of band (admin inserted a new first
        // item): the second re-locks, the third stays open.
        assert_eq!(
            unlock_flags(true, &[false, true, false]),
            vec![true, false, true]
        );
    }

    #[test]
    fn empty_sequence_has_no_flags() {
        assert!(unlock_flags(true, &[]).is_empty());
    }
}
