//! Routine library
//!
//! Named routines selectable from the presentation layer, by exact name
//! or by 1-based position.

use super::definition::{Group, RoutineDefinition, RoutineError};
use super::motion::Direction;

/// Names of the builtin routines, in library order
pub const BUILTIN_ROUTINES: [&str; 3] = ["Routine 1", "Routine 2", "Routine 3"];

const ALL_FINGERS: &[u8] = &[1, 2, 3, 4, 5];
const FOUR_FINGERS: &[u8] = &[2, 3, 4, 5];
const THUMB: &[u8] = &[1];

/// Ordered collection of routines
#[derive(Debug, Clone, Default)]
pub struct RoutineLibrary {
    routines: Vec<RoutineDefinition>,
}

impl RoutineLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with the three reference routines
    ///
    /// - Routine 1: all fingers together, 2 s advance, 4 s pause, 2 s retract
    /// - Routine 2: all fingers together, 0.5 s advance, 4 s pause, 0.5 s retract
    /// - Routine 3: four fingers and thumb alternating, 2 s / 1 s / 2 s
    pub fn builtin() -> Self {
        let mut library = Self::new();
        let routines = [
            builtin_routine(BUILTIN_ROUTINES[0], &[(ALL_FINGERS, 2.0, 4.0, 2.0)]),
            builtin_routine(BUILTIN_ROUTINES[1], &[(ALL_FINGERS, 0.5, 4.0, 0.5)]),
            builtin_routine(
                BUILTIN_ROUTINES[2],
                &[
                    (FOUR_FINGERS, 2.0, 1.0, 2.0),
                    (THUMB, 2.0, 1.0, 2.0),
                    (FOUR_FINGERS, 2.0, 1.0, 2.0),
                    (THUMB, 2.0, 1.0, 2.0),
                    (FOUR_FINGERS, 2.0, 1.0, 2.0),
                ],
            ),
        ];
        for routine in routines.into_iter().flatten() {
            library.insert(routine);
        }
        library
    }

    /// Add a routine, replacing any routine with the same name
    ///
    /// Returns the replaced routine. A replacement keeps its position.
    pub fn insert(&mut self, routine: RoutineDefinition) -> Option<RoutineDefinition> {
        match self.routines.iter_mut().find(|r| r.name() == routine.name()) {
            Some(existing) => Some(core::mem::replace(existing, routine)),
            None => {
                self.routines.push(routine);
                None
            }
        }
    }

    /// Look up a routine by exact name
    pub fn get(&self, name: &str) -> Option<&RoutineDefinition> {
        self.routines.iter().find(|r| r.name() == name)
    }

    /// Look up a routine by 1-based position
    pub fn by_index(&self, index: usize) -> Option<&RoutineDefinition> {
        index.checked_sub(1).and_then(|i| self.routines.get(i))
    }

    /// Resolve a selector: exact name first, then a 1-based index
    pub fn resolve(&self, selector: &str) -> Result<&RoutineDefinition, RoutineError> {
        let selector = selector.trim();
        self.get(selector)
            .or_else(|| selector.parse::<usize>().ok().and_then(|i| self.by_index(i)))
            .ok_or_else(|| RoutineError::UnknownRoutine(selector.to_string()))
    }

    /// Routine names in library order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.iter().map(|r| r.name())
    }

    /// Iterate over routines in library order
    pub fn iter(&self) -> impl Iterator<Item = &RoutineDefinition> {
        self.routines.iter()
    }

    /// Number of routines
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Check if the library is empty
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

/// Build a builtin routine from (actuators, advance, pause, retract) rows
fn builtin_routine(name: &str, rows: &[(&[u8], f64, f64, f64)]) -> Option<RoutineDefinition> {
    let groups = rows
        .iter()
        .map(|&(ids, advance, pause, retract)| {
            Group::uniform(ids, advance, pause, retract, Direction::Open)
        })
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    RoutineDefinition::new(name, groups).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn ids(group: &Group) -> Vec<u8> {
        group.actuators().map(|a| a.get()).collect()
    }

    #[test]
    fn test_builtin_names() {
        let library = RoutineLibrary::builtin();
        let names: Vec<&str> = library.names().collect();
        assert_eq!(names, BUILTIN_ROUTINES);
    }

    #[test]
    fn test_routine_1_layout() {
        let library = RoutineLibrary::builtin();
        let routine = library.get("Routine 1").unwrap();

        assert_eq!(routine.groups().len(), 1);
        let group = &routine.groups()[0];
        assert_eq!(ids(group), [1, 2, 3, 4, 5]);

        let spec = group.moves()[0];
        assert_eq!(spec.advance, Duration::from_secs(2));
        assert_eq!(spec.pause, Duration::from_secs(4));
        assert_eq!(spec.retract, Duration::from_secs(2));
        assert_eq!(spec.start, Direction::Open);
    }

    #[test]
    fn test_routine_2_timing() {
        let library = RoutineLibrary::builtin();
        let spec = library.get("Routine 2").unwrap().groups()[0].moves()[4];

        assert_eq!(spec.actuator.get(), 5);
        assert_eq!(spec.advance, Duration::from_millis(500));
        assert_eq!(spec.retract, Duration::from_millis(500));
    }

    #[test]
    fn test_routine_3_alternates() {
        let library = RoutineLibrary::builtin();
        let routine = library.get("Routine 3").unwrap();

        let layout: Vec<Vec<u8>> = routine.groups().iter().map(ids).collect();
        assert_eq!(
            layout,
            vec![
                vec![2, 3, 4, 5],
                vec![1],
                vec![2, 3, 4, 5],
                vec![1],
                vec![2, 3, 4, 5]
            ]
        );
    }

    #[test]
    fn test_resolve_by_name_and_index() {
        let library = RoutineLibrary::builtin();

        assert_eq!(library.resolve("Routine 2").unwrap().name(), "Routine 2");
        assert_eq!(library.resolve("3").unwrap().name(), "Routine 3");
        assert_eq!(
            library.resolve("Routine 9").unwrap_err(),
            RoutineError::UnknownRoutine("Routine 9".into())
        );
        assert!(library.resolve("0").is_err());
        assert!(library.resolve("4").is_err());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut library = RoutineLibrary::builtin();
        let group = Group::uniform(&[3], 1.0, 0.0, 1.0, Direction::Close).unwrap();
        let custom = RoutineDefinition::new("Routine 2", vec![group]).unwrap();

        let replaced = library.insert(custom);
        assert!(replaced.is_some());
        assert_eq!(library.len(), 3);
        assert_eq!(library.by_index(2).unwrap().groups()[0].len(), 1);
    }

    #[test]
    fn test_insert_appends_new_name() {
        let mut library = RoutineLibrary::new();
        assert!(library.is_empty());

        let group = Group::uniform(&[1, 2], 1.0, 0.5, 1.0, Direction::Open).unwrap();
        let pinch = RoutineDefinition::new("Pinch", vec![group]).unwrap();
        assert!(library.insert(pinch).is_none());
        assert_eq!(library.resolve("1").unwrap().name(), "Pinch");
    }
}
