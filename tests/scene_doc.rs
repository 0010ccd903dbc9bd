use stagecraft::{
    CachedClips, ComposeOptions, ComposeThreading, FrameIndex, MemoryHost, SceneTimelineDoc,
    StaticClips, Vec3, compose,
};

fn load_doc() -> SceneTimelineDoc {
    SceneTimelineDoc::from_json(include_str!("data/story_scene.json")).unwrap()
}

#[test]
fn document_resolves_with_chained_positions() {
    let scene = load_doc().to_scene().unwrap();

    let boy = scene.character("boy").unwrap();
    assert_eq!(boy.cues.len(), 3);
    assert_eq!(boy.cues[0].start_position, Vec3::ZERO);
    assert_eq!(boy.cues[0].end_position, Vec3::new(-3.0, -6.0, 0.0));
    // Idle and waving cues hold the walked-to position.
    assert_eq!(boy.cues[2].start_position, Vec3::new(-3.0, -6.0, 0.0));
    assert_eq!(boy.cues[2].end_position, Vec3::new(-3.0, -6.0, 0.0));

    // The girl is absent from the first entry; her first cue starts at
    // her cast position at frame 100.
    let girl = scene.character("girl").unwrap();
    assert_eq!(girl.cues[0].range.start, FrameIndex(100));
    assert_eq!(girl.cues[0].start_position, Vec3::new(4.0, 10.0, 0.0));

    assert_eq!(scene.audio.len(), 5);
    assert_eq!(scene.backdrop.setting.as_deref(), Some("textures/forest.jpg"));
}

#[test]
fn document_composes_end_to_end() {
    let doc = load_doc();
    let scene = doc.to_scene().unwrap();
    let clips = CachedClips::new(StaticClips::from_table(doc.clips.clone()));

    let mut host = MemoryHost::new();
    let report = compose(
        &scene,
        &clips,
        &mut host,
        &ComposeOptions {
            threading: ComposeThreading::Parallel { threads: Some(2) },
            ..ComposeOptions::default()
        },
    )
    .unwrap();

    assert_eq!(report.characters.len(), 2);
    assert_eq!(report.scene_end, FrameIndex(260 + stagecraft::SCENE_TAIL_FRAMES));
    assert_eq!(host.rigs.len(), 2);
    // Two chase cameras plus the default four-camera establishing ring.
    assert_eq!(host.cameras.len(), 6);
    assert_eq!(report.audio_events, 5);
    assert!(report.camera_cuts > 0);

    // The girl's walk window (frames 100-180) has the boy idle: she is the
    // single mover once the boy's waving entry has not started yet.
    // Frames 180+ have two movers (both waving), so establishing wins.
    let girl_chase = host
        .cameras
        .iter()
        .find(|c| c.spec.name == "girl_chase")
        .unwrap()
        .id;
    assert!(host.cuts.iter().any(|c| c.camera == girl_chase));
}

#[test]
fn pose_keyframes_are_strictly_ordered_per_rig() {
    let doc = load_doc();
    let scene = doc.to_scene().unwrap();
    let clips = CachedClips::new(StaticClips::from_table(doc.clips.clone()));
    let mut host = MemoryHost::new();
    compose(&scene, &clips, &mut host, &ComposeOptions::default()).unwrap();

    for rig in &host.rigs {
        let frames: Vec<u64> = host
            .keyframes
            .iter()
            .filter(|k| k.rig == rig.id)
            .map(|k| k.frame.0)
            .collect();
        assert!(frames.windows(2).all(|w| w[0] < w[1]), "rig {:?}", rig.id);
    }
}
