use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use geom_kernel::SolidHandle;
use optics_types::{Angle, BranchIndex, Transform, BOLT_14_20, DEFAULT_OPTICS_DZ, INCH};
use part_factory::primitives::{self, Align, BoxSpec, CylinderSpec};
use part_factory::{BuiltPart, Factory, FactoryConfig, KernelBundle, PartDescriptor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::beam::{BeamOrigin, BeamPath, Stop};
use crate::graph::{NodeId, PlacementGraph};
use crate::journal::JournalEntry;
use crate::types::{Anchor, BeamId, ElementId, LayoutError, PlacedElement};

/// Dimensions, pose and machining features of a baseplate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseplateSpec {
    pub dx: f64,
    pub dy: f64,
    /// Plate thickness.
    pub dz: f64,
    pub x: f64,
    pub y: f64,
    /// Rotation of the plate about z, in degrees.
    pub angle: f64,
    /// Inset of the stock on every side; x-split slots are `2 * gap` wide.
    pub gap: f64,
    /// Cells `[i, j]` of the one-inch grid that get a 1/4-20 mount hole.
    pub mount_holes: Vec<[u32; 2]>,
    /// Plate-frame x positions of machining seams.
    pub x_splits: Vec<f64>,
    pub label: String,
    /// Height of the beam plane above the plate top.
    pub optics_dz: f64,
    pub stl_dir: PathBuf,
}

impl Default for BaseplateSpec {
    fn default() -> Self {
        Self {
            dx: 4.0 * INCH,
            dy: 4.0 * INCH,
            dz: INCH,
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            gap: 0.0,
            mount_holes: Vec::new(),
            x_splits: Vec::new(),
            label: "Baseplate".into(),
            optics_dz: DEFAULT_OPTICS_DZ,
            stl_dir: PathBuf::from("stl"),
        }
    }
}

impl BaseplateSpec {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, x: f64, y: f64, angle: f64) -> Self {
        self.x = x;
        self.y = y;
        self.angle = angle;
        self
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_mount_holes(mut self, holes: Vec<[u32; 2]>) -> Self {
        self.mount_holes = holes;
        self
    }

    pub fn with_x_splits(mut self, splits: Vec<f64>) -> Self {
        self.x_splits = splits;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_optics_dz(mut self, optics_dz: f64) -> Self {
        self.optics_dz = optics_dz;
        self
    }

    /// Plate pose in the document.
    pub fn origin(&self) -> Transform {
        Transform::planar(self.x, self.y, 0.0, self.angle)
    }

    pub fn factory_config(&self) -> FactoryConfig {
        FactoryConfig {
            optics_dz: self.optics_dz,
            plate_dz: self.dz,
            stl_dir: self.stl_dir.clone(),
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        for (name, value) in [("dx", self.dx), ("dy", self.dy), ("dz", self.dz)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidDimension { name, value });
            }
        }
        if !self.gap.is_finite()
            || self.gap < 0.0
            || 2.0 * self.gap >= self.dx.min(self.dy)
        {
            return Err(LayoutError::InvalidDimension {
                name: "gap",
                value: self.gap,
            });
        }
        if !self.optics_dz.is_finite() || self.optics_dz < 0.0 {
            return Err(LayoutError::InvalidDimension {
                name: "optics_dz",
                value: self.optics_dz,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Entity {
    Plate,
    Beam(BeamPath),
    Element(PlacedElement),
}

/// A part built but not yet registered; `parent` indexes an earlier entry.
struct Pending {
    name: String,
    part: PartDescriptor,
    built: BuiltPart,
    parent: Option<usize>,
    relative: Transform,
}

/// A rectangular plate with the beams and parts placed on it.
///
/// Beams hang off the plate node, elements along a beam hang off that
/// beam, and relative or nested elements hang off the element they were
/// placed from. Placements resolve eagerly; [`Baseplate::finalize`] cuts
/// every registered drill out of the stock in one boolean.
#[derive(Debug)]
pub struct Baseplate {
    id: Uuid,
    spec: BaseplateSpec,
    factory: Factory,
    graph: PlacementGraph<Entity>,
    root: NodeId,
    names: HashMap<String, NodeId>,
    elements: Vec<NodeId>,
    beams: Vec<NodeId>,
    journal: Vec<JournalEntry>,
    finalized: Option<SolidHandle>,
}

impl Baseplate {
    pub fn new(spec: BaseplateSpec) -> Result<Self, LayoutError> {
        spec.validate()?;
        let mut graph = PlacementGraph::new();
        let root = graph.insert_root(Entity::Plate, spec.origin());
        info!(
            label = %spec.label,
            dx = spec.dx,
            dy = spec.dy,
            dz = spec.dz,
            "baseplate created"
        );
        Ok(Self {
            id: Uuid::new_v4(),
            factory: Factory::new(spec.factory_config()),
            spec,
            graph,
            root,
            names: HashMap::new(),
            elements: Vec::new(),
            beams: Vec::new(),
            journal: Vec::new(),
            finalized: None,
        })
    }

    /// Rebuild a baseplate by replaying `journal` against a fresh plate.
    pub fn replay(
        spec: BaseplateSpec,
        journal: &[JournalEntry],
        kb: &mut dyn KernelBundle,
    ) -> Result<Self, LayoutError> {
        let mut plate = Self::new(spec)?;
        for entry in journal {
            plate.apply(entry, kb)?;
        }
        Ok(plate)
    }

    /// Perform one journaled operation.
    pub fn apply(
        &mut self,
        entry: &JournalEntry,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), LayoutError> {
        match entry {
            JournalEntry::AddBeam { origin, wavelength } => {
                self.add_beam(*origin, *wavelength)?;
            }
            JournalEntry::Place {
                name,
                part,
                x,
                y,
                angle,
            } => {
                self.place_element(name, part.clone(), *x, *y, *angle, kb)?;
            }
            JournalEntry::PlaceAlongBeam {
                name,
                part,
                beam,
                branch,
                stop,
                angle,
            } => {
                let beam = self.beam_at(*beam).ok_or_else(|| LayoutError::UnknownBeam {
                    beam: format!("#{beam}"),
                })?;
                self.place_element_along_beam(beam, name, part.clone(), *branch, *stop, *angle, kb)?;
            }
            JournalEntry::PlaceRelative {
                name,
                part,
                base,
                x_offset,
                y_offset,
                angle,
            } => {
                let base = self.lookup(base)?;
                self.place_element_relative(base, name, part.clone(), *x_offset, *y_offset, *angle, kb)?;
            }
            JournalEntry::AttachChild {
                name,
                part,
                parent,
                offset,
            } => {
                let parent = self.lookup(parent)?;
                self.attach_child(parent, name, part.clone(), *offset, kb)?;
            }
            JournalEntry::SetOrigin { x, y, angle } => self.set_origin(*x, *y, *angle),
        }
        Ok(())
    }

    // ── Beams ───────────────────────────────────────────────────────────

    /// Add a beam in the beam plane at plate coordinates `(x, y)`.
    pub fn add_beam_path(
        &mut self,
        x: f64,
        y: f64,
        angle: f64,
        wavelength: Option<f64>,
    ) -> Result<BeamId, LayoutError> {
        self.add_beam(BeamOrigin::Planar { x, y, angle }, wavelength)
    }

    /// Add a beam whose plane is tilted by `angle_x` and `angle_y`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_beam_path_general(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        angle_x: f64,
        angle_y: f64,
        angle_z: f64,
        wavelength: Option<f64>,
    ) -> Result<BeamId, LayoutError> {
        self.add_beam(
            BeamOrigin::General {
                x,
                y,
                z,
                angle_x,
                angle_y,
                angle_z,
            },
            wavelength,
        )
    }

    pub fn add_beam(
        &mut self,
        origin: BeamOrigin,
        wavelength: Option<f64>,
    ) -> Result<BeamId, LayoutError> {
        if let Some(w) = wavelength {
            if !w.is_finite() || w <= 0.0 {
                return Err(LayoutError::InvalidDimension {
                    name: "wavelength",
                    value: w,
                });
            }
        }
        let name = format!("Beam Path {}", self.beams.len() + 1);
        debug!(beam = %name, ?origin, ?wavelength, "beam added");
        let node = self
            .graph
            .attach(
                self.root,
                Entity::Beam(BeamPath::new(name, origin, wavelength)),
                origin.transform(),
            )
            .ok_or(LayoutError::UnattachedParent)?;
        self.beams.push(node);
        self.journal.push(JournalEntry::AddBeam { origin, wavelength });
        Ok(BeamId {
            plate: self.id,
            node,
        })
    }

    pub fn beam(&self, id: BeamId) -> Option<&BeamPath> {
        if id.plate != self.id {
            return None;
        }
        match &self.graph.get(id.node)?.data {
            Entity::Beam(path) => Some(path),
            _ => None,
        }
    }

    /// Beam frame in plate coordinates.
    pub fn beam_transform(&self, id: BeamId) -> Option<Transform> {
        self.beam(id)?;
        self.graph.get(id.node).map(|n| *n.relative())
    }

    /// Beams in creation order.
    pub fn beams(&self) -> Vec<BeamId> {
        self.beams
            .iter()
            .map(|&node| BeamId {
                plate: self.id,
                node,
            })
            .collect()
    }

    pub fn beam_at(&self, ordinal: usize) -> Option<BeamId> {
        self.beams.get(ordinal).map(|&node| BeamId {
            plate: self.id,
            node,
        })
    }

    fn beam_ordinal(&self, id: BeamId) -> Option<usize> {
        if id.plate != self.id {
            return None;
        }
        self.beams.iter().position(|&n| n == id.node)
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Place a part directly on the plate at plate coordinates.
    pub fn place_element(
        &mut self,
        name: &str,
        part: PartDescriptor,
        x: f64,
        y: f64,
        angle: f64,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let relative = Transform::planar(x, y, 0.0, angle);
        let id = self.insert_part(self.root, name, part.clone(), relative, Anchor::Plate, kb)?;
        self.journal.push(JournalEntry::Place {
            name: name.into(),
            part,
            x,
            y,
            angle,
        });
        Ok(id)
    }

    /// Place a part on `branch` of `beam`, advancing or splitting that branch.
    #[allow(clippy::too_many_arguments)]
    pub fn place_element_along_beam(
        &mut self,
        beam: BeamId,
        name: &str,
        part: PartDescriptor,
        branch: BranchIndex,
        stop: impl Into<Stop>,
        angle: impl Into<Angle>,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let (stop, angle) = (stop.into(), angle.into());
        let ordinal = self.beam_ordinal(beam).ok_or_else(|| LayoutError::UnknownBeam {
            beam: format!("{:?}", beam.node),
        })?;
        self.check_name(name)?;
        let (path, frame) = match self.graph.get(beam.node) {
            Some(node) => match &node.data {
                Entity::Beam(path) => (path, *node.relative()),
                _ => return Err(LayoutError::UnattachedParent),
            },
            None => return Err(LayoutError::UnattachedParent),
        };
        let step = path.plan(&frame, name, branch, stop, angle, part.kind.optical_role())?;

        let anchor = Anchor::Beam { beam, branch };
        let id = self.insert_part(beam.node, name, part.clone(), step.pose, anchor, kb)?;
        if let Some(Entity::Beam(path)) = self.graph.data_mut(beam.node) {
            path.apply(&step, id);
        }
        self.journal.push(JournalEntry::PlaceAlongBeam {
            name: name.into(),
            part,
            beam: ordinal,
            branch,
            stop,
            angle,
        });
        Ok(id)
    }

    /// Place a part at a plate-frame offset from `base`, facing `angle`.
    ///
    /// The part follows `base` if the base ever moves.
    #[allow(clippy::too_many_arguments)]
    pub fn place_element_relative(
        &mut self,
        base: ElementId,
        name: &str,
        part: PartDescriptor,
        x_offset: f64,
        y_offset: f64,
        angle: f64,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let base_node = self.element_node(base).ok_or(LayoutError::UnattachedParent)?;
        let base_pose = self
            .graph
            .pose_in(base_node, self.root)
            .ok_or(LayoutError::UnattachedParent)?;
        let [bx, by, bz] = base_pose.translation();
        let target = Transform::planar(bx + x_offset, by + y_offset, bz, angle);
        let relative = target.relative_to(&base_pose);
        let id = self.insert_part(
            base_node,
            name,
            part.clone(),
            relative,
            Anchor::Relative { base },
            kb,
        )?;
        self.journal.push(JournalEntry::PlaceRelative {
            name: name.into(),
            part,
            base: self.name_of(base_node),
            x_offset,
            y_offset,
            angle,
        });
        Ok(id)
    }

    /// Attach a part under `parent` at `offset` in the parent's frame.
    pub fn attach_child(
        &mut self,
        parent: ElementId,
        name: &str,
        part: PartDescriptor,
        offset: Transform,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let parent_node = self.element_node(parent).ok_or(LayoutError::UnattachedParent)?;
        let id = self.insert_part(
            parent_node,
            name,
            part.clone(),
            offset,
            Anchor::Child { parent },
            kb,
        )?;
        self.journal.push(JournalEntry::AttachChild {
            name: name.into(),
            part,
            parent: self.name_of(parent_node),
            offset,
        });
        Ok(id)
    }

    /// Move the plate; every beam and element follows.
    pub fn set_origin(&mut self, x: f64, y: f64, angle: f64) {
        self.spec.x = x;
        self.spec.y = y;
        self.spec.angle = angle;
        self.graph.set_relative(self.root, self.spec.origin());
        self.finalized = None;
        self.journal.push(JournalEntry::SetOrigin { x, y, angle });
        info!(label = %self.spec.label, x, y, angle, "baseplate moved");
    }

    fn check_name(&self, name: &str) -> Result<(), LayoutError> {
        if self.names.contains_key(name) {
            return Err(LayoutError::DuplicateElementName { name: name.into() });
        }
        Ok(())
    }

    /// Build `part` and its nested children, then register them all.
    /// Nothing is registered unless every build succeeds and every name is free.
    fn insert_part(
        &mut self,
        parent: NodeId,
        name: &str,
        part: PartDescriptor,
        relative: Transform,
        anchor: Anchor,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        self.check_name(name)?;
        let mut pending = Vec::new();
        self.build_tree(name.to_string(), part, relative, None, kb, &mut pending)?;

        let mut seen = HashSet::new();
        for p in &pending {
            if self.names.contains_key(&p.name) || !seen.insert(p.name.as_str()) {
                return Err(LayoutError::DuplicateElementName {
                    name: p.name.clone(),
                });
            }
        }

        let mut nodes: Vec<NodeId> = Vec::with_capacity(pending.len());
        for p in pending {
            let (parent_node, anchor) = match p.parent {
                None => (parent, anchor),
                Some(i) => (
                    nodes[i],
                    Anchor::Child {
                        parent: self.handle(nodes[i]),
                    },
                ),
            };
            let kind = p.part.kind.name();
            let element = PlacedElement {
                name: p.name.clone(),
                part: p.part,
                anchor,
                display: p.built.display,
                drill: p.built.drill,
                optics: p.built.optics,
            };
            let node = self
                .graph
                .attach(parent_node, Entity::Element(element), p.relative)
                .ok_or(LayoutError::UnattachedParent)?;
            if let Some(pose) = self.graph.pose_in(node, self.root) {
                debug!(
                    element = %p.name,
                    kind,
                    position = ?pose.translation(),
                    heading = pose.heading_deg(),
                    "element placed"
                );
            }
            self.names.insert(p.name, node);
            self.elements.push(node);
            nodes.push(node);
        }
        self.finalized = None;
        Ok(self.handle(nodes[0]))
    }

    fn build_tree(
        &mut self,
        name: String,
        part: PartDescriptor,
        relative: Transform,
        parent: Option<usize>,
        kb: &mut dyn KernelBundle,
        out: &mut Vec<Pending>,
    ) -> Result<(), LayoutError> {
        let mut built = self.factory.build(kb, &part)?;
        let children = std::mem::take(&mut built.children);
        let index = out.len();
        out.push(Pending {
            name: name.clone(),
            part,
            built,
            parent,
            relative,
        });
        for child in children {
            self.build_tree(
                format!("{name}/{}", child.name),
                child.part,
                child.offset,
                Some(index),
                kb,
                out,
            )?;
        }
        Ok(())
    }

    // ── Finalize ────────────────────────────────────────────────────────

    /// The stock minus every mount hole, x-split slot and element drill,
    /// placed at the plate origin.
    ///
    /// The result is cached until the next placement or move, so repeated
    /// calls return the same solid.
    pub fn finalize(&mut self, kb: &mut dyn KernelBundle) -> Result<SolidHandle, LayoutError> {
        if let Some(solid) = &self.finalized {
            trace!(label = %self.spec.label, "finalize served from cache");
            return Ok(solid.clone());
        }
        let s = &self.spec;
        let top = -s.optics_dz;
        let bottom = top - s.dz;
        let stock = primitives::make_box(
            kb,
            &BoxSpec::new(s.dx - 2.0 * s.gap, s.dy - 2.0 * s.gap, s.dz).at(s.gap, s.gap, bottom),
        )?;

        let mut tools = Vec::new();
        let bolt = BOLT_14_20;
        for [i, j] in &s.mount_holes {
            let x = (*i as f64 + 0.5) * INCH;
            let y = (*j as f64 + 0.5) * INCH;
            tools.push(primitives::make_cylinder(
                kb,
                &CylinderSpec::new(bolt.clear_dia, s.dz)
                    .at(x, y, top)
                    .counterbore(bolt.head_dia, bolt.head_dz),
            )?);
        }
        for &x in &s.x_splits {
            if s.gap <= 0.0 || x <= 0.0 || x >= s.dx {
                debug!(x, gap = s.gap, "x-split skipped");
                continue;
            }
            tools.push(primitives::make_box(
                kb,
                &BoxSpec::new(2.0 * s.gap, s.dy, s.dz)
                    .at(x, 0.0, bottom)
                    .align(Align::Center, Align::Positive, Align::Positive),
            )?);
        }
        for &node in &self.elements {
            let Some(Entity::Element(element)) = self.graph.get(node).map(|n| &n.data) else {
                continue;
            };
            let (Some(drill), Some(pose)) = (&element.drill, self.graph.pose_in(node, self.root))
            else {
                continue;
            };
            tools.push(kb.transformed(drill, &pose)?);
        }

        let count = tools.len();
        let cut = primitives::cut_all(kb, stock, tools)?;
        let placed = kb.transformed(&cut, &self.spec.origin())?;
        info!(label = %self.spec.label, drills = count, "baseplate finalized");
        self.finalized = Some(placed.clone());
        Ok(placed)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn spec(&self) -> &BaseplateSpec {
        &self.spec
    }

    pub fn label(&self) -> &str {
        &self.spec.label
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Every successful operation so far, oldest first.
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn handle(&self, node: NodeId) -> ElementId {
        ElementId {
            plate: self.id,
            node,
        }
    }

    fn element_node(&self, id: ElementId) -> Option<NodeId> {
        if id.plate != self.id {
            return None;
        }
        match self.graph.get(id.node)?.data {
            Entity::Element(_) => Some(id.node),
            _ => None,
        }
    }

    fn name_of(&self, node: NodeId) -> String {
        match self.graph.get(node).map(|n| &n.data) {
            Some(Entity::Element(e)) => e.name.clone(),
            _ => String::new(),
        }
    }

    fn lookup(&self, name: &str) -> Result<ElementId, LayoutError> {
        self.element_id(name)
            .ok_or_else(|| LayoutError::UnknownElement { name: name.into() })
    }

    pub fn element(&self, id: ElementId) -> Option<&PlacedElement> {
        let node = self.element_node(id)?;
        match &self.graph.get(node)?.data {
            Entity::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_id(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).map(|&node| self.handle(node))
    }

    pub fn element_by_name(&self, name: &str) -> Option<&PlacedElement> {
        self.element(self.element_id(name)?)
    }

    /// Elements in placement order, nested children right after their parent.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &PlacedElement)> + '_ {
        self.elements.iter().filter_map(move |&node| {
            let id = self.handle(node);
            self.element(id).map(|e| (id, e))
        })
    }

    /// Absolute pose in the document.
    pub fn transform(&self, id: ElementId) -> Option<Transform> {
        let node = self.element_node(id)?;
        self.graph.get(node).map(|n| *n.absolute())
    }

    /// Pose in the plate frame.
    pub fn plate_transform(&self, id: ElementId) -> Option<Transform> {
        self.graph.pose_in(self.element_node(id)?, self.root)
    }

    /// Stored offset from the node the element hangs off (plate, beam or element).
    pub fn relative_transform(&self, id: ElementId) -> Option<Transform> {
        let node = self.element_node(id)?;
        self.graph.get(node).map(|n| *n.relative())
    }

    /// Absolute pose of whatever the element hangs off.
    pub fn parent_transform(&self, id: ElementId) -> Option<Transform> {
        let parent = self.graph.get(self.element_node(id)?)?.parent()?;
        self.graph.get(parent).map(|n| *n.absolute())
    }

    /// Elements attached directly under `id`.
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        let Some(node) = self.element_node(id) else {
            return Vec::new();
        };
        self.graph
            .children(node)
            .iter()
            .map(|&child| self.handle(child))
            .collect()
    }

    /// Every element below `id`, depth first.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let Some(node) = self.element_node(id) else {
            return Vec::new();
        };
        self.graph
            .descendants(node)
            .into_iter()
            .map(|n| self.handle(n))
            .collect()
    }
}
