//! Stat Block Rendering Module
//!
//! Turns a resolved, normalized creature into the structured display
//! document: header, defenses, ability scores, proficiency block, and
//! the trait/spellcasting/action sections, in fixed order. Sections with
//! no content are omitted entirely.
//!
//! A record that still carries unresolved variant forks and no selected
//! variant renders as a [`ForkSelectionDocument`] instead — an ambiguous
//! record is never rendered as a stat block.

use serde::Serialize;

use super::error::Result;
use super::markup::{expand, MarkupContext};
use super::normalize::{
    ability_modifier, format_modifier, normalize, NormalizedCreature,
};
use super::resolve::{select_variant, variant_names};
use super::types::{CreatureRecord, Entry, Feature};

// ============================================================================
// Options
// ============================================================================

/// Caller-supplied rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Which fork of a multi-variant record to render.
    pub variant: Option<String>,
    /// Substituted for `PB` markup tokens.
    pub proficiency_bonus: Option<String>,
    /// Substituted for spell-level markup tokens.
    pub spell_level: Option<String>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, name: impl Into<String>) -> Self {
        self.variant = Some(name.into());
        self
    }

    pub fn with_proficiency_bonus(mut self, pb: impl ToString) -> Self {
        self.proficiency_bonus = Some(pb.to_string());
        self
    }

    pub fn with_spell_level(mut self, level: impl ToString) -> Self {
        self.spell_level = Some(level.to_string());
        self
    }

    fn markup_context(&self) -> MarkupContext {
        MarkupContext {
            proficiency_bonus: self.proficiency_bonus.clone(),
            spell_level: self.spell_level.clone(),
        }
    }
}

// ============================================================================
// Output documents
// ============================================================================

/// Result of a render request: either a stat block or, for an ambiguous
/// multi-variant record, the list of forks to choose from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderOutput {
    StatBlock(StatBlockDocument),
    ForkSelection(ForkSelectionDocument),
}

/// The structured stat block display document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatBlockDocument {
    /// Creature name.
    pub name: String,
    /// "Size type (tags), alignment" line.
    pub meta: String,
    /// Challenge rating in display form.
    pub challenge: String,
    /// "Armor Class N" line content.
    pub armor_class: String,
    /// "Hit Points N (formula)" line content.
    pub hit_points: String,
    /// Speed line content.
    pub speed: String,
    /// Six ability columns in STR..CHA order.
    pub abilities: Vec<AbilityColumn>,
    /// Labeled proficiency lines (saves, skills, senses, ...), in order.
    pub profile: Vec<LabeledLine>,
    /// Trait/spellcasting/action sections, in fixed order, empty omitted.
    pub sections: Vec<Section>,
}

/// One ability column: label, score, derived modifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbilityColumn {
    pub label: String,
    pub score: i64,
    pub modifier: String,
}

/// One labeled line of the proficiency block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledLine {
    pub label: String,
    pub text: String,
}

/// A titled section of named features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub features: Vec<RenderedFeature>,
}

/// One feature with markup-expanded body text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFeature {
    pub name: String,
    pub text: String,
}

/// Fork list for an ambiguous multi-variant record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForkSelectionDocument {
    /// The record's own name.
    pub name: String,
    /// Selectable variant names in membership order (base first when
    /// the record isn't template-only).
    pub variants: Vec<String>,
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a resolved record.
///
/// A record with unresolved `_versions` short-circuits to a fork
/// selection unless `options.variant` picks one; an unknown variant name
/// is the only error path.
pub fn render(record: &CreatureRecord, options: &RenderOptions) -> Result<RenderOutput> {
    if record.has_versions() {
        match &options.variant {
            Some(name) => {
                let selected = select_variant(record, name)?;
                return Ok(RenderOutput::StatBlock(render_stat_block(
                    &normalize(&selected),
                    options,
                )));
            }
            None => {
                return Ok(RenderOutput::ForkSelection(ForkSelectionDocument {
                    name: record.name().to_string(),
                    variants: variant_names(record),
                }));
            }
        }
    }
    Ok(RenderOutput::StatBlock(render_stat_block(
        &normalize(record),
        options,
    )))
}

/// Build the stat block document from a normalized creature.
pub fn render_stat_block(
    creature: &NormalizedCreature,
    options: &RenderOptions,
) -> StatBlockDocument {
    let ctx = options.markup_context();

    let meta = format!(
        "{} {}, {}",
        creature.size_display(),
        creature.creature_type.display(),
        creature.alignment
    );

    let hit_points = match &creature.hp.formula {
        Some(formula) => format!("{} ({})", creature.hp.average, formula),
        None => creature.hp.average.to_string(),
    };

    let abilities = creature
        .abilities
        .iter()
        .iter()
        .map(|(label, score)| AbilityColumn {
            label: label.to_string(),
            score: *score,
            modifier: format_modifier(ability_modifier(*score)),
        })
        .collect();

    StatBlockDocument {
        name: creature.name.clone(),
        meta,
        challenge: creature.cr_display(),
        armor_class: creature.ac.to_string(),
        hit_points,
        speed: speed_line(creature),
        abilities,
        profile: profile_lines(creature, &ctx),
        sections: sections(creature, &ctx),
    }
}

/// Speed line: walk first, then the other modes in a fixed order.
fn speed_line(creature: &NormalizedCreature) -> String {
    let mut parts = vec![format!("{} ft.", creature.speed.walk)];
    for (label, value) in [
        ("burrow", creature.speed.burrow),
        ("climb", creature.speed.climb),
        ("fly", creature.speed.fly),
        ("swim", creature.speed.swim),
    ] {
        if let Some(value) = value {
            parts.push(format!("{label} {value} ft."));
        }
    }
    parts.join(", ")
}

/// Proficiency block lines in fixed order; empty lines omitted.
fn profile_lines(creature: &NormalizedCreature, ctx: &MarkupContext) -> Vec<LabeledLine> {
    let mut lines = Vec::new();
    let mut push = |label: &str, text: String| {
        if !text.is_empty() {
            lines.push(LabeledLine {
                label: label.to_string(),
                text: expand(&text, ctx),
            });
        }
    };

    push("Saving Throws", join_bonuses(&creature.saves));
    push("Skills", join_bonuses(&creature.skills));
    push("Damage Resistances", creature.resist.join("; "));
    push("Damage Immunities", creature.immune.join("; "));
    push("Damage Vulnerabilities", creature.vulnerable.join("; "));
    push("Condition Immunities", creature.condition_immune.join(", "));

    let mut senses = creature.senses.join(", ");
    if let Some(passive) = creature.passive {
        if senses.is_empty() {
            senses = format!("passive Perception {passive}");
        } else {
            senses = format!("{senses}, passive Perception {passive}");
        }
    }
    push("Senses", senses);
    push("Languages", creature.languages.join(", "));

    lines
}

fn join_bonuses(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, bonus)| format!("{} {}", capitalize(name), bonus))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Feature sections in fixed order; sections with no features omitted.
fn sections(creature: &NormalizedCreature, ctx: &MarkupContext) -> Vec<Section> {
    let groups: [(&str, &Vec<Feature>); 6] = [
        ("Traits", &creature.traits),
        ("Spellcasting", &creature.spellcasting),
        ("Actions", &creature.actions),
        ("Bonus Actions", &creature.bonus_actions),
        ("Reactions", &creature.reactions),
        ("Legendary Actions", &creature.legendary),
    ];

    groups
        .into_iter()
        .filter(|(_, features)| !features.is_empty())
        .map(|(title, features)| Section {
            title: title.to_string(),
            features: features
                .iter()
                .map(|feature| RenderedFeature {
                    name: expand(&feature.name, ctx),
                    text: entries_text(&feature.entries, ctx),
                })
                .collect(),
        })
        .collect()
}

/// Flatten a feature's entries to display text, one entry per line.
fn entries_text(entries: &[Entry], ctx: &MarkupContext) -> String {
    let mut lines = Vec::new();
    for entry in entries {
        match entry {
            Entry::Text(text) => lines.push(expand(text, ctx)),
            Entry::List { items, .. } => {
                for item in items {
                    match item {
                        Entry::Text(text) => lines.push(format!("• {}", expand(text, ctx))),
                        other => {
                            let nested = entries_text(std::slice::from_ref(other), ctx);
                            if !nested.is_empty() {
                                lines.push(format!("• {nested}"));
                            }
                        }
                    }
                }
            }
            Entry::Named { name, entries } => {
                let body = entries_text(entries, ctx);
                lines.push(format!("{}. {body}", expand(name, ctx)));
            }
            // Shapes the renderer doesn't understand render as nothing.
            Entry::Other(_) => {}
        }
    }
    lines.join("\n")
}

// ============================================================================
// Display
// ============================================================================

impl std::fmt::Display for StatBlockDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", self.meta)?;
        writeln!(f, "Challenge {}", self.challenge)?;
        writeln!(f, "---")?;
        writeln!(f, "Armor Class {}", self.armor_class)?;
        writeln!(f, "Hit Points {}", self.hit_points)?;
        writeln!(f, "Speed {}", self.speed)?;
        writeln!(f, "---")?;
        let labels: Vec<String> = self
            .abilities
            .iter()
            .map(|a| format!("{:<4}", a.label))
            .collect();
        let scores: Vec<String> = self
            .abilities
            .iter()
            .map(|a| format!("{:<2} ({})", a.score, a.modifier))
            .collect();
        writeln!(f, "{}", labels.join(" "))?;
        writeln!(f, "{}", scores.join("  "))?;
        if !self.profile.is_empty() {
            writeln!(f, "---")?;
            for line in &self.profile {
                writeln!(f, "{} {}", line.label, line.text)?;
            }
        }
        for section in &self.sections {
            writeln!(f, "\n{}", section.title)?;
            for feature in &section.features {
                writeln!(f, "{}. {}", feature.name, feature.text)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ForkSelectionDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} has multiple variants:", self.name)?;
        for variant in &self.variants {
            writeln!(f, "  - {variant}")?;
        }
        write!(f, "Select one with --variant <name>")
    }
}

// ============================================================================
// Tests
// ============================================================================
