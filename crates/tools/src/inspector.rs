use electric_kernel::ElectricScene;
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene for the settings panel, the CLI and
/// logs.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene state.
    pub fn summary(scene: &ElectricScene) -> SceneSummary {
        SceneSummary {
            time: scene.time(),
            frames: scene.clock().frames(),
            paused: scene.is_paused(),
            time_scale: scene.time_scale(),
            instance_count: scene.instance_count(),
            rings: scene
                .rings()
                .iter()
                .map(|ring| RingSummary {
                    name: ring.name().to_string(),
                    instances: ring.len(),
                })
                .collect(),
        }
    }

    /// One instance of a named ring, as of the last tick.
    pub fn inspect_instance(scene: &ElectricScene, ring: &str, index: usize) -> Option<InstanceInfo> {
        let ring_ref = scene.ring(ring)?;
        let state = ring_ref.states().get(index)?;
        let t = &state.transform;
        let r = t.rotation;
        Some(InstanceInfo {
            ring: ring_ref.name().to_string(),
            index,
            time: scene.time(),
            position: t.position.to_array(),
            rotation: [r.x, r.y, r.z, r.w],
            scale: t.scale,
            color: state.color.to_array(),
        })
    }

    /// Every instance of a ring, in index order.
    pub fn inspect_ring(scene: &ElectricScene, ring: &str) -> Option<Vec<InstanceInfo>> {
        let len = scene.ring(ring)?.len();
        (0..len)
            .map(|i| Self::inspect_instance(scene, ring, i))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingSummary {
    pub name: String,
    pub instances: usize,
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub time: f64,
    pub frames: u64,
    pub paused: bool,
    pub time_scale: f64,
    pub instance_count: usize,
    pub rings: Vec<RingSummary>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: time={:.3}s frames={} instances={}",
            self.time, self.frames, self.instance_count
        )?;
        if self.paused {
            write!(f, " (paused)")?;
        }
        for ring in &self.rings {
            write!(f, "\n  {}: {}", ring.name, ring.instances)?;
        }
        Ok(())
    }
}

/// Detailed info about a single placed instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceInfo {
    pub ring: String,
    pub index: usize,
    pub time: f64,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: f32,
    pub color: [f32; 3],
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] t={:.3} pos=({:.2}, {:.2}, {:.2}) scale={:.3} rgb=({:.2}, {:.2}, {:.2})",
            self.ring,
            self.index,
            self.time,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale,
            self.color[0],
            self.color[1],
            self.color[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use electric_kernel::SceneConfig;

    fn scene() -> ElectricScene {
        ElectricScene::new(SceneConfig::default()).unwrap()
    }

    #[test]
    fn summary_fresh_scene() {
        let summary = SceneInspector::summary(&scene());
        assert_eq!(summary.time, 0.0);
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.instance_count, 261);
        let names: Vec<_> = summary.rings.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["central", "upper", "lower"]);
    }

    #[test]
    fn summary_after_ticks() {
        let mut scene = scene();
        scene.tick(0.016);
        scene.tick(0.016);
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.frames, 2);
        assert!((summary.time - 0.032).abs() < 1e-12);
    }

    #[test]
    fn inspect_instance_found() {
        let scene = scene();
        let info = SceneInspector::inspect_instance(&scene, "central", 0).unwrap();
        let expected = scene.ring("central").unwrap().states()[0].transform.position;
        assert_eq!(info.position, expected.to_array());
        assert_eq!(info.index, 0);
    }

    #[test]
    fn inspect_instance_not_found() {
        let scene = scene();
        assert!(SceneInspector::inspect_instance(&scene, "nope", 0).is_none());
        assert!(SceneInspector::inspect_instance(&scene, "central", 100).is_none());
    }

    #[test]
    fn inspect_ring_lists_everything() {
        let scene = scene();
        let all = SceneInspector::inspect_ring(&scene, "upper").unwrap();
        assert_eq!(all.len(), 80);
        assert_eq!(all[79].index, 79);
    }

    #[test]
    fn summary_display() {
        let mut scene = scene();
        scene.set_paused(true);
        let s = format!("{}", SceneInspector::summary(&scene));
        assert!(s.contains("time=0.000s"));
        assert!(s.contains("(paused)"));
        assert!(s.contains("lower: 80"));
    }

    #[test]
    fn instance_serializes_to_json() {
        let scene = scene();
        let info = SceneInspector::inspect_instance(&scene, "lower", 3).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["ring"], "lower");
        assert_eq!(json["index"], 3);
        assert_eq!(json["position"].as_array().map(Vec::len), Some(3));
    }
}
