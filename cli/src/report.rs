//! Plain-text tables for replay output

use meter_core::ticks_to_secs;
use meter_types::PlayerSummary;

use crate::commands::SectionReport;

pub fn print_sections(sections: &[SectionReport]) {
    if sections.is_empty() {
        return;
    }
    println!();
    println!("{:<8} {:<12} {:>8} {:>8} {:>10}", "Section", "Ended by", "Entities", "Events", "Last (s)");
    println!("{}", "-".repeat(50));
    for section in sections {
        let last = section
            .last_event_secs
            .map(|secs| format!("{secs:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<12} {:>8} {:>8} {:>10}",
            section.section_id, section.reason, section.entities, section.events, last
        );
    }
}

pub fn print_players(scope: &str, players: &[PlayerSummary]) {
    println!();
    if players.is_empty() {
        println!("{scope}: no statistics");
        return;
    }

    println!("{scope}");
    println!(
        "{:<12} {:<4} {:>12} {:>10} {:>7} {:>12} {:>12} {:>10} {:>7} {:>9}",
        "Entity", "NPC", "Damage", "DPS", "Crit%", "Taken", "Healing", "HPS", "Deaths", "Active(s)"
    );
    println!("{}", "-".repeat(104));

    for player in sorted_by_damage(players) {
        let active = ticks_to_secs(player.last_tick.saturating_sub(player.start_tick));
        println!(
            "{:<12} {:<4} {:>12} {:>10.1} {:>7.1} {:>12} {:>12} {:>10.1} {:>7} {:>9.1}",
            player.entity_id,
            if player.is_npc { "yes" } else { "" },
            player.attack_damage.total,
            player.attack_damage.value_per_second,
            player.attack_damage.crit_rate() * 100.0,
            player.taken_damage.total,
            player.healing.total,
            player.healing.value_per_second,
            player.death_count,
            active,
        );
    }
}

/// Highest damage first, entity id breaking ties
fn sorted_by_damage(players: &[PlayerSummary]) -> Vec<&PlayerSummary> {
    let mut sorted: Vec<&PlayerSummary> = players.iter().collect();
    sorted.sort_by(|a, b| {
        b.attack_damage
            .total
            .cmp(&a.attack_damage.total)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(entity_id: i64, damage: i64) -> PlayerSummary {
        let mut summary = PlayerSummary {
            entity_id,
            ..Default::default()
        };
        summary.attack_damage.total = damage;
        summary
    }

    #[test]
    fn test_sorted_by_damage() {
        let players = vec![player(3, 10), player(1, 50), player(2, 50)];
        let ids: Vec<i64> = sorted_by_damage(&players).iter().map(|p| p.entity_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
