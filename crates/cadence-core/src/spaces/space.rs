// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{Dimension, MappingRoute, SpaceError, SpaceMapping, State};
use std::{
    borrow::Cow,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock, RwLockReadGuard, Weak,
    },
};

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`Space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(u64);

impl SpaceId {
    fn next() -> Self {
        Self(NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "space#{}", self.0)
    }
}

/// How [`Space::map_with`] treats a State from an unrelated Space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapMode {
    /// Fail with [`SpaceError::Unrepresentable`] when no mapping exists.
    #[default]
    Strict,
    /// Fall back to positional projection when the arity matches.
    Forced,
}

/// Anything [`Space::map`] accepts.
#[derive(Debug, Clone)]
pub enum Candidate<'a> {
    /// Raw values in dimension order.
    Values(Cow<'a, [f64]>),
    /// A bare scalar, valid for one-dimensional spaces only.
    Scalar(f64),
    /// A State from this or another Space.
    State(&'a State),
}

impl<'a> From<&'a [f64]> for Candidate<'a> {
    fn from(values: &'a [f64]) -> Self {
        Candidate::Values(Cow::Borrowed(values))
    }
}

impl<'a> From<&'a Vec<f64>> for Candidate<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        Candidate::Values(Cow::Borrowed(values.as_slice()))
    }
}

impl From<Vec<f64>> for Candidate<'_> {
    fn from(values: Vec<f64>) -> Self {
        Candidate::Values(Cow::Owned(values))
    }
}

impl<const N: usize> From<[f64; N]> for Candidate<'_> {
    fn from(values: [f64; N]) -> Self {
        Candidate::Values(Cow::Owned(values.to_vec()))
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for Candidate<'a> {
    fn from(values: &'a [f64; N]) -> Self {
        Candidate::Values(Cow::Borrowed(values.as_slice()))
    }
}

impl From<f64> for Candidate<'_> {
    fn from(value: f64) -> Self {
        Candidate::Scalar(value)
    }
}

impl<'a> From<&'a State> for Candidate<'a> {
    fn from(state: &'a State) -> Self {
        Candidate::State(state)
    }
}

struct SpaceInner {
    id: SpaceId,
    name: String,
    dimensions: Vec<Arc<Dimension>>,
    parent: Option<Space>,
    origin: Option<Vec<f64>>,
    mappings: RwLock<Vec<SpaceMapping>>,
}

/// An ordered set of [`Dimension`]s defining a coordinate system.
///
/// `Space` is a shared handle: clones refer to the same coordinate system and
/// compare equal. Each Space indexes every [`SpaceMapping`] it takes part in,
/// so conversions can be discovered from either side.
#[derive(Clone)]
pub struct Space {
    inner: Arc<SpaceInner>,
}

/// Non-owning reference used by mappings to reach their endpoints.
#[derive(Clone)]
pub(crate) struct WeakSpace(Weak<SpaceInner>);

impl WeakSpace {
    pub(crate) fn upgrade(&self) -> Option<Space> {
        self.0.upgrade().map(|inner| Space { inner })
    }
}

impl Space {
    /// Creates an anonymous Space from its dimensions, in positional order.
    ///
    /// Dimensions may be passed by value or as `Arc`s shared with other spaces.
    pub fn new<I, D>(dimensions: I) -> Result<Self, SpaceError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Arc<Dimension>>,
    {
        Self::build(None, dimensions.into_iter().map(Into::into).collect(), None, None)
    }

    /// Creates a named Space. The name only serves diagnostics.
    pub fn with_name<I, D>(name: impl Into<String>, dimensions: I) -> Result<Self, SpaceError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Arc<Dimension>>,
    {
        Self::build(
            Some(name.into()),
            dimensions.into_iter().map(Into::into).collect(),
            None,
            None,
        )
    }

    /// Creates a Space of unconstrained dimensions.
    ///
    /// ```
    /// use cadence_core::Space;
    ///
    /// let plane = Space::from_names(["x", "y"]).unwrap();
    /// let p = plane.map([1.0, 2.0]).unwrap();
    /// assert_eq!(p["y"], 2.0);
    /// ```
    pub fn from_names<I, S>(names: I) -> Result<Self, SpaceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Dimension::new))
    }

    /// Creates a Space expressed relative to `origin`, a State of `parent`.
    ///
    /// The local Space shares the parent's dimensions and is connected to it by
    /// an invertible mapping: `parent = origin + local`.
    pub fn local(parent: &Space, origin: &State) -> Result<Self, SpaceError> {
        let origin = parent.map(origin)?;
        let local = Self::build(
            Some(format!("{}_local", parent.name())),
            parent.inner.dimensions.clone(),
            Some(parent.clone()),
            Some(origin.values().to_vec()),
        )?;

        let offset = origin.values().to_vec();
        let inverse_offset = offset.clone();
        SpaceMapping::invertible(
            &local,
            parent,
            move |s: &State| s.values().iter().zip(&offset).map(|(v, o)| v + o).collect(),
            move |s: &State| {
                s.values()
                    .iter()
                    .zip(&inverse_offset)
                    .map(|(v, o)| v - o)
                    .collect()
            },
        );
        Ok(local)
    }

    /// A Space with the dimensions of `self` followed by those of `other`.
    ///
    /// Dimensions are shared, not copied. Fails with
    /// [`SpaceError::DuplicateDimension`] when a name appears on both sides.
    pub fn concat(&self, other: &Space) -> Result<Self, SpaceError> {
        let dimensions = self
            .inner
            .dimensions
            .iter()
            .chain(&other.inner.dimensions)
            .cloned()
            .collect();
        Self::build(
            Some(format!("{}_{}", self.name(), other.name())),
            dimensions,
            None,
            None,
        )
    }

    fn build(
        name: Option<String>,
        dimensions: Vec<Arc<Dimension>>,
        parent: Option<Space>,
        origin: Option<Vec<f64>>,
    ) -> Result<Self, SpaceError> {
        let mut seen = HashSet::with_capacity(dimensions.len());
        for dim in &dimensions {
            dim.validate()?;
            if !seen.insert(dim.name()) {
                return Err(SpaceError::DuplicateDimension(dim.name().to_string()));
            }
        }

        let id = SpaceId::next();
        let name = name.unwrap_or_else(|| format!("space_{}", id.0));
        log::debug!(
            "Space '{}' created with {} dimension(s).",
            name,
            dimensions.len()
        );
        Ok(Self {
            inner: Arc::new(SpaceInner {
                id,
                name,
                dimensions,
                parent,
                origin,
                mappings: RwLock::new(Vec::new()),
            }),
        })
    }

    /// The Space's identity.
    pub fn id(&self) -> SpaceId {
        self.inner.id
    }

    /// The diagnostic name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.inner.dimensions.len()
    }

    /// Returns `true` for a zero-dimensional Space.
    pub fn is_empty(&self) -> bool {
        self.inner.dimensions.is_empty()
    }

    /// The dimensions in positional order.
    pub fn dimensions(&self) -> &[Arc<Dimension>] {
        &self.inner.dimensions
    }

    /// The dimension at position `index`.
    pub fn dimension(&self, index: usize) -> Option<&Dimension> {
        self.inner.dimensions.get(index).map(AsRef::as_ref)
    }

    /// The dimension called `name`.
    pub fn dimension_by_name(&self, name: &str) -> Option<&Dimension> {
        self.index_of(name).and_then(|i| self.dimension(i))
    }

    /// Position of the dimension called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.dimensions.iter().position(|d| d.name() == name)
    }

    /// Returns `true` if a dimension called `name` exists.
    pub fn has_dimension(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Dimension names in positional order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.dimensions.iter().map(|d| d.name())
    }

    /// The Space a local Space is relative to.
    pub fn parent(&self) -> Option<&Space> {
        self.inner.parent.as_ref()
    }

    /// The origin of a local Space, as a State of its parent.
    pub fn origin(&self) -> Option<State> {
        let parent = self.inner.parent.as_ref()?;
        let origin = self.inner.origin.as_ref()?;
        Some(State::from_projected(parent.clone(), origin.clone()))
    }

    /// A State with every component at zero, or at the lower limit when zero
    /// is rejected by its dimension.
    pub fn zeros(&self) -> State {
        let values = self
            .inner
            .dimensions
            .iter()
            .map(|d| {
                d.project_value(0.0)
                    .unwrap_or_else(|_| d.limits().map_or(0.0, |(low, _)| low))
            })
            .collect();
        State::from_projected(self.clone(), values)
    }

    /// Maps a candidate into this Space, failing when no mapping exists.
    pub fn map<'a>(&self, candidate: impl Into<Candidate<'a>>) -> Result<State, SpaceError> {
        self.map_with(candidate, MapMode::Strict)
    }

    /// Maps a candidate into this Space, projecting positionally when no
    /// mapping exists but the arity matches.
    pub fn map_forced<'a>(&self, candidate: impl Into<Candidate<'a>>) -> Result<State, SpaceError> {
        self.map_with(candidate, MapMode::Forced)
    }

    /// Maps a candidate into this Space with an explicit [`MapMode`].
    ///
    /// Resolution order for a State candidate: same Space, then a registered
    /// mapping in either direction, then (forced mode only) positional
    /// projection. A one-way mapping used backwards is never bypassed.
    pub fn map_with<'a>(
        &self,
        candidate: impl Into<Candidate<'a>>,
        mode: MapMode,
    ) -> Result<State, SpaceError> {
        match candidate.into() {
            Candidate::Values(values) => self.state_from(&values),
            Candidate::Scalar(value) => {
                if self.len() != 1 {
                    return Err(SpaceError::DimensionMismatch {
                        expected: self.len(),
                        found: 1,
                    });
                }
                self.state_from(&[value])
            }
            Candidate::State(state) => match state.space().mapping_route(self) {
                Ok(route) => route.apply(state),
                Err(SpaceError::Unrepresentable { .. }) if mode == MapMode::Forced => {
                    log::trace!(
                        "Forced positional projection from '{}' into '{}'.",
                        state.space().name(),
                        self.name()
                    );
                    self.state_from(state.values())
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Returns `true` if a mapping connects the two spaces, in either direction.
    pub fn has_mapping(&self, other: &Space) -> bool {
        self.read_mappings()
            .iter()
            .any(|m| m.connects(self.id(), other.id()))
    }

    /// Finds how a State of this Space converts into `to`.
    pub fn mapping_route(&self, to: &Space) -> Result<MappingRoute, SpaceError> {
        if self == to {
            return Ok(MappingRoute::Identity);
        }

        let mappings = self.read_mappings();
        if let Some(m) = mappings
            .iter()
            .find(|m| m.from_id() == self.id() && m.to_id() == to.id())
        {
            return Ok(MappingRoute::Forward(m.clone()));
        }

        let mut reverse = mappings
            .iter()
            .filter(|m| m.from_id() == to.id() && m.to_id() == self.id())
            .peekable();
        if reverse.peek().is_none() {
            return Err(SpaceError::Unrepresentable {
                from: self.name().to_string(),
                to: to.name().to_string(),
            });
        }
        match reverse.find(|m| m.is_invertible()) {
            Some(m) => Ok(MappingRoute::Inverse(m.clone())),
            None => Err(SpaceError::NotInvertible {
                from: self.name().to_string(),
                to: to.name().to_string(),
            }),
        }
    }

    /// Every mapping this Space takes part in.
    pub fn mappings(&self) -> Vec<SpaceMapping> {
        self.read_mappings().clone()
    }

    pub(crate) fn register_mapping(&self, mapping: SpaceMapping) {
        let mut mappings = self
            .inner
            .mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        mappings.push(mapping);
    }

    pub(crate) fn downgrade(&self) -> WeakSpace {
        WeakSpace(Arc::downgrade(&self.inner))
    }

    /// Projects raw values through the dimensions, checking the arity.
    pub(crate) fn project_values(&self, values: &[f64]) -> Result<Vec<f64>, SpaceError> {
        if values.len() != self.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.len(),
                found: values.len(),
            });
        }
        self.inner
            .dimensions
            .iter()
            .zip(values)
            .map(|(dim, &v)| dim.project_value(v))
            .collect()
    }

    pub(crate) fn state_from(&self, values: &[f64]) -> Result<State, SpaceError> {
        Ok(State::from_projected(self.clone(), self.project_values(values)?))
    }

    fn read_mappings(&self) -> RwLockReadGuard<'_, Vec<SpaceMapping>> {
        self.inner
            .mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Space {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Space {}

impl Hash for Space {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("dimensions", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
