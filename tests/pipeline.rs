use pastel::prelude::*;

fn pipeline() -> Pipeline {
    let mut pipeline = Pipeline::new();
    for id in 0..3 {
        pipeline.add_pass(PipelinePass::new(id, None));
    }

    pipeline
}

#[test]
fn frame_bracket() {
    let mut pipeline = pipeline();
    assert_eq!(pipeline.num_passes(), 3);
    assert!(pipeline.begin_pass(0).is_none());

    assert_eq!(pipeline.begin_frame(), 3);
    assert!(pipeline.is_in_frame());
    assert_eq!(pipeline.begin_frame(), 0);

    for i in 0..3 {
        assert_eq!(pipeline.begin_pass(i).map(|v| v.id()), Some(i as u32));
        assert_eq!(pipeline.current_pass(), Some(i));
        assert!(pipeline.end_pass(i));
        assert_eq!(pipeline.current_pass(), None);
    }

    assert!(pipeline.begin_pass(3).is_none());
    pipeline.end_frame();
    assert!(!pipeline.is_in_frame());
    assert_eq!(pipeline.begin_frame(), 3);
}

#[test]
fn mismatched_end_pass() {
    let mut pipeline = pipeline();
    assert!(!pipeline.end_pass(0));

    pipeline.begin_frame();
    pipeline.begin_pass(1);
    assert!(!pipeline.end_pass(0));
    assert!(!pipeline.end_pass(2));
    assert_eq!(pipeline.current_pass(), Some(1));
    assert_eq!(pipeline.num_passes(), 3);
    assert!(pipeline.end_pass(1));
}

#[test]
fn empty() {
    let mut pipeline = Pipeline::new();
    assert_eq!(pipeline.begin_frame(), 0);
    assert!(!pipeline.is_in_frame());
}

#[test]
fn clear() {
    let mut pipeline = pipeline();
    pipeline.begin_frame();
    pipeline.begin_pass(2);
    pipeline.clear();

    assert!(!pipeline.is_in_frame());
    assert_eq!(pipeline.current_pass(), None);
    assert_eq!(pipeline.num_passes(), 0);
    assert!(pipeline.pass(0).is_none());
}

#[test]
fn default_pipeline() {
    let pipeline = Pipeline::default_pipeline();
    assert_eq!(pipeline.num_passes(), 3);

    for (i, pass) in pipeline.passes().iter().enumerate() {
        assert_eq!(pass.id(), i as u32);
        assert!(PipelinePass::pass_name_by_id(pass.id()).is_some());
    }

    let scene = pipeline.pass(0).unwrap().states();
    assert!(scene.clear.bits.contains(ClearBits::COLOR | ClearBits::DEPTH));
    assert_eq!(scene.blend.blend, None);

    let dbg = pipeline.pass(2).unwrap().states();
    assert!(dbg.clear.bits.is_empty());
    assert!(dbg.blend.blend.is_some());
}

#[test]
fn structural_equality() {
    let mut a = PipelinePass::new(0, None);
    let b = PipelinePass::new(0, None);
    assert_eq!(a, b);

    a.states_mut().cull.face = CullFace::Front;
    assert_ne!(a, b);

    a.states_mut().cull.face = CullFace::Back;
    assert_eq!(a, b);

    a.states_mut().stencil.enabled = true;
    assert_ne!(a, b);
}
