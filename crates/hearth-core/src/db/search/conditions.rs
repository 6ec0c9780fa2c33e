use crate::db::predicate::Predicate;

///
/// Conjunction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Conjunction {
    And,
    Or,
}

///
/// ConditionGroup
///
/// One named subtree of the query's condition tree.
///
/// `bypassed` is the cooperative short-circuit: once set, the group renders
/// as `True` and later contributors see the flag and stand down.
/// `contributed` separates "a filter ran and allowed nothing" (renders as
/// `False`) from "nobody touched this group" (omitted).
///

#[derive(Clone, Debug)]
struct ConditionGroup {
    name: String,
    conjunction: Conjunction,
    conditions: Vec<Predicate>,
    bypassed: bool,
    contributed: bool,
}

impl ConditionGroup {
    fn render(&self) -> Option<Predicate> {
        if self.bypassed {
            return Some(Predicate::True);
        }
        if self.conditions.is_empty() {
            return self.contributed.then_some(Predicate::False);
        }

        let conditions = self.conditions.clone();
        Some(match self.conjunction {
            Conjunction::And => Predicate::And(conditions),
            Conjunction::Or => Predicate::Or(conditions),
        })
    }
}

///
/// SearchConditions
///
/// Shared builder context for a search query's conditions: plain base
/// conditions plus named groups owned by individual contributors.
///

#[derive(Clone, Debug, Default)]
pub struct SearchConditions {
    base: Vec<Predicate>,
    groups: Vec<ConditionGroup>,
}

impl SearchConditions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition outside any named group.
    pub fn add(&mut self, predicate: Predicate) {
        self.base.push(predicate);
    }

    /// Hand out the named group, creating it with `conjunction` on first use.
    pub fn scope(&mut self, name: &str, conjunction: Conjunction) -> ConditionScope<'_> {
        let idx = match self.groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                self.groups.push(ConditionGroup {
                    name: name.to_string(),
                    conjunction,
                    conditions: Vec::new(),
                    bypassed: false,
                    contributed: false,
                });
                self.groups.len() - 1
            }
        };

        ConditionScope {
            group: &mut self.groups[idx],
        }
    }

    #[must_use]
    pub fn is_bypassed(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name && g.bypassed)
    }

    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name)
    }

    /// Rendered predicate of one group, if it contributes anything.
    #[must_use]
    pub fn group_predicate(&self, name: &str) -> Option<Predicate> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .and_then(ConditionGroup::render)
    }

    /// Lower everything into a single predicate: base conditions and all
    /// rendered groups, conjoined.
    #[must_use]
    pub fn to_predicate(&self) -> Predicate {
        let mut parts: Vec<Predicate> = self.base.clone();
        parts.extend(self.groups.iter().filter_map(ConditionGroup::render));

        match parts.len() {
            0 => Predicate::True,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }
}

///
/// ConditionScope
///
/// Handle to one named group. Contributors never see sibling groups.
///

pub struct ConditionScope<'a> {
    group: &'a mut ConditionGroup,
}

impl ConditionScope<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.group.name
    }

    #[must_use]
    pub const fn is_bypassed(&self) -> bool {
        self.group.bypassed
    }

    /// Add a condition. Dropped once the group is bypassed.
    pub fn push(&mut self, predicate: Predicate) {
        self.group.contributed = true;
        if !self.group.bypassed {
            self.group.conditions.push(predicate);
        }
    }

    /// Record that a contributor evaluated this group, even if it adds nothing.
    pub const fn mark_contributed(&mut self) {
        self.group.contributed = true;
    }

    /// Replace the group with a single always-true condition and flag it.
    pub fn bypass(&mut self) {
        self.group.conditions = vec![Predicate::True];
        self.group.bypassed = true;
        self.group.contributed = true;
    }

    #[must_use]
    pub fn conditions(&self) -> &[Predicate] {
        &self.group.conditions
    }
}
