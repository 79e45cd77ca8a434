// src/city/scene.rs
//! Mirrors shape-tree changes into entities: one entity per node (parented with
//! `ChildOf`), one `SceneRoot` child per leaf element.
//! Bundle-free: components are added explicitly.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::grammar::core::{Element, StyleRole};
use crate::grammar::tree::{NodeId, SceneSink};

/// Tag on every entity that mirrors a shape node.
#[derive(Component, Debug, Clone, Copy)]
pub struct ShapeNodeTag(pub NodeId);

/// Tag on every spawned leaf.
#[derive(Component, Debug, Clone, Copy)]
pub struct CityElement {
    pub node: NodeId,
    pub role: StyleRole,
}

/// Entity bookkeeping for the city scene.
#[derive(Resource, Default)]
pub struct CitySceneMap {
    /// Parent of every root building entity.
    pub city_root: Option<Entity>,
    nodes: HashMap<NodeId, Entity>,
    elements: HashMap<NodeId, Vec<Entity>>,
}

impl CitySceneMap {
    #[inline] pub fn node_entity(&self, node: NodeId) -> Option<Entity> { self.nodes.get(&node).copied() }
}

/// `SceneSink` over `Commands` for one sync pass.
pub struct SceneWriter<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub assets: &'a AssetServer,
    pub map: &'a mut CitySceneMap,
}

impl SceneWriter<'_, '_, '_> {
    fn despawn_elements(&mut self, node: NodeId) {
        if let Some(ents) = self.map.elements.remove(&node) {
            for e in ents {
                self.commands.entity(e).try_despawn();
            }
        }
    }
}

impl SceneSink for SceneWriter<'_, '_, '_> {
    fn node_created(&mut self, node: NodeId, parent: Option<NodeId>, name: &str, local: Transform) {
        let parent_entity = match parent {
            Some(p) => self.map.node_entity(p),
            None => self.map.city_root,
        };
        let mut e = self.commands.spawn((
            Name::new(name.to_string()),
            local,
            GlobalTransform::IDENTITY,
            Visibility::Inherited,
            ShapeNodeTag(node),
        ));
        if let Some(p) = parent_entity { e.insert(ChildOf(p)); }
        let id = e.id();
        self.map.nodes.insert(node, id);
    }

    fn element_spawned(&mut self, node: NodeId, element: &Element) {
        let Some(parent) = self.map.node_entity(node) else { return };
        let scene: Handle<Scene> = self.assets.load(element.style.path.as_str());
        let e = self
            .commands
            .spawn((
                element.transform,
                GlobalTransform::IDENTITY,
                Visibility::Inherited,
                SceneRoot(scene),
                CityElement { node, role: element.role },
                ChildOf(parent),
            ))
            .id();
        self.map.elements.entry(node).or_default().push(e);
    }

    fn node_cleared(&mut self, node: NodeId) {
        self.despawn_elements(node);
    }

    fn node_removed(&mut self, node: NodeId) {
        self.despawn_elements(node);
        if let Some(e) = self.map.nodes.remove(&node) {
            self.commands.entity(e).try_despawn();
        }
    }
}
