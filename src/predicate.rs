//! Item predicates for filtered boosts.
//!
//! Filters are plain descriptors rather than closures so they can be
//! loaded from static data, validated against it, and compared in tests.

use crate::data::StaticData;
use crate::error::DataIntegrityError;
use crate::item::{Category, Item, ItemTypeId};
use serde::{Deserialize, Serialize};

/// A test over a static item definition.
///
/// # Examples
///
/// ```rust
/// use fitcalc::Predicate;
/// use fitcalc::item::{Category, Item, ItemTypeId};
///
/// let rep = Item::new(ItemTypeId(3), "Small Remote Armor Repairer I",
///     "Armor Repair Projector", Category::Module);
///
/// assert!(Predicate::group("Armor Repair Projector").matches(&rep));
/// assert!(Predicate::not(Predicate::group("ECM Burst")).matches(&rep));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Any,
    Group(String),
    Category(Category),
    RequiresSkill(String),
    TypeIs(ItemTypeId),
    Not(Box<Predicate>),
    All(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn group(name: impl Into<String>) -> Self {
        Predicate::Group(name.into())
    }

    pub fn requires_skill(name: impl Into<String>) -> Self {
        Predicate::RequiresSkill(name.into())
    }

    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::Group(group) => item.group == *group,
            Predicate::Category(category) => item.category == *category,
            Predicate::RequiresSkill(skill) => item.requires_skill(skill),
            Predicate::TypeIs(type_id) => item.type_id == *type_id,
            Predicate::Not(inner) => !inner.matches(item),
            Predicate::All(all) => all.iter().all(|p| p.matches(item)),
            Predicate::AnyOf(any) => any.iter().any(|p| p.matches(item)),
        }
    }

    /// Check every name the predicate mentions against the static data.
    ///
    /// A predicate that merely matches nothing is fine; one naming a group
    /// or skill the data has never heard of is a broken dataset.
    pub fn validate(&self, data: &StaticData) -> Result<(), DataIntegrityError> {
        match self {
            Predicate::Any | Predicate::Category(_) => Ok(()),
            Predicate::Group(group) => {
                if data.has_group(group) {
                    Ok(())
                } else {
                    Err(DataIntegrityError::UnknownGroup(group.clone()))
                }
            }
            Predicate::RequiresSkill(skill) => data.skill(skill).map(|_| ()),
            Predicate::TypeIs(type_id) => data.item(*type_id).map(|_| ()),
            Predicate::Not(inner) => inner.validate(data),
            Predicate::All(list) | Predicate::AnyOf(list) => {
                list.iter().try_for_each(|p| p.validate(data))
            }
        }
    }
}
