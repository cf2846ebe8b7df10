//! Participant persona model and registry.
//!
//! Personas are the synthetic participants of a focus group interview.
//! The moderator is configured separately (style level, topic) and is never
//! stored in the registry.

use crate::error::{FgiError, Result};
use serde::{Deserialize, Serialize};

/// A named participant profile driving generated dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name, unique within the registry.
    pub name: String,
    /// Free-text attribute description (age, family, income, worries, ...).
    pub profile: String,
}

/// Insertion-ordered collection of personas.
///
/// Order matters: `list()` order is the speaking order in every interview
/// cycle, so the registry is backed by a `Vec` rather than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a persona, or overwrites the profile of an existing one.
    ///
    /// Overwriting is last-write-wins with no merge; the persona keeps its
    /// original position in the speaking order.
    ///
    /// # Errors
    ///
    /// Returns `FgiError::Validation` if `name` or `profile` is empty after
    /// trimming. Nothing is mutated in that case.
    pub fn add(&mut self, name: impl Into<String>, profile: impl Into<String>) -> Result<()> {
        let name = name.into().trim().to_string();
        let profile = profile.into().trim().to_string();

        if name.is_empty() {
            return Err(FgiError::validation("persona name must not be empty"));
        }
        if profile.is_empty() {
            return Err(FgiError::validation("persona profile must not be empty"));
        }

        if let Some(existing) = self.personas.iter_mut().find(|p| p.name == name) {
            existing.profile = profile;
        } else {
            self.personas.push(Persona { name, profile });
        }

        Ok(())
    }

    /// Removes a persona by name. No-op when the name is absent.
    pub fn remove(&mut self, name: &str) {
        self.personas.retain(|p| p.name != name);
    }

    /// Returns all personas in insertion (= speaking) order.
    pub fn list(&self) -> &[Persona] {
        &self.personas
    }

    /// Removes all personas.
    pub fn clear(&mut self) {
        self.personas.clear();
    }

    /// Returns the number of registered personas.
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Returns `true` if no personas are registered.
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

/// Parses a `Name: profile` roster, one persona per line.
///
/// Lines without a `:` separator are skipped. This is the bulk-entry format
/// operators use to paste a whole panel at once.
///
/// # Errors
///
/// Returns `FgiError::Validation` if any parsed line has an empty name or
/// profile.
pub fn parse_roster(text: &str) -> Result<Vec<Persona>> {
    let mut personas = Vec::new();

    for line in text.lines() {
        let Some((name, profile)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let profile = profile.trim();
        if name.is_empty() || profile.is_empty() {
            return Err(FgiError::validation(format!(
                "malformed roster line: '{}'",
                line.trim()
            )));
        }
        personas.push(Persona {
            name: name.to_string(),
            profile: profile.to_string(),
        });
    }

    Ok(personas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_list_preserves_insertion_order() {
        let mut registry = PersonaRegistry::new();
        registry.add("Tanaka", "40, married, one child").unwrap();
        registry.add("Sato", "28, single, IT worker").unwrap();
        registry.add("Suzuki", "55, homemaker").unwrap();

        let names: Vec<&str> = registry.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Tanaka", "Sato", "Suzuki"]);
    }

    #[test]
    fn test_add_overwrites_in_place() {
        let mut registry = PersonaRegistry::new();
        registry.add("Tanaka", "first profile").unwrap();
        registry.add("Sato", "other profile").unwrap();
        registry.add("Tanaka", "second profile").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[0].name, "Tanaka");
        assert_eq!(registry.list()[0].profile, "second profile");
    }

    #[test]
    fn test_add_rejects_empty_input() {
        let mut registry = PersonaRegistry::new();
        assert!(registry.add("", "profile").unwrap_err().is_validation());
        assert!(registry.add("Name", "  ").unwrap_err().is_validation());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent_and_order_preserving() {
        let mut registry = PersonaRegistry::new();
        registry.add("A", "a").unwrap();
        registry.add("B", "b").unwrap();
        registry.add("C", "c").unwrap();

        registry.remove("B");
        registry.remove("B");
        registry.remove("nobody");

        let names: Vec<&str> = registry.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_parse_roster() {
        let text = "Tanaka: 40, career woman\n\nnot a persona line\nSato: 28, single";
        let personas = parse_roster(text).unwrap();

        assert_eq!(personas.len(), 2);
        assert_eq!(personas[0].name, "Tanaka");
        assert_eq!(personas[1].profile, "28, single");
    }

    #[test]
    fn test_parse_roster_rejects_empty_name() {
        assert!(parse_roster(": profile only").unwrap_err().is_validation());
    }
}
