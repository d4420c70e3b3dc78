use criterion::{black_box, criterion_group, criterion_main, Criterion};

use armature::{
    FillFlags, FrameInput, GridSizer, Insets, Key, KeyEvent, Rect, Root, Sizer, Vec2,
};

fn build_root() -> Root {
    let mut root = Root::new(Vec2::new(1280.0, 720.0));
    let screen = root.root_node();

    let mut column = Sizer::vertical();
    let mut panels = Vec::new();
    for row in 0..4 {
        let panel = root.tree_mut().create(format!("panel_{row}"));
        root.tree_mut().set_parent(panel, screen).unwrap();
        let mut grid = Sizer::Grid(GridSizer::new(4, 8));
        for r in 0..4 {
            for col in 0..8 {
                let cell = root.tree_mut().create(format!("cell_{row}_{r}_{col}"));
                root.tree_mut().set_parent(cell, panel).unwrap();
                let node = root.tree_mut().node_mut(cell).unwrap();
                node.min_size = Vec2::new(24.0, 12.0);
                node.focusable = true;
                node.mouse_interactive = true;
                grid.place(cell, r, col, Insets::uniform(1.0), FillFlags::FILL)
                    .unwrap();
            }
        }
        root.tree_mut().node_mut(panel).unwrap().set_sizer(grid);
        column.add(panel, 1.0, Insets::uniform(2.0), FillFlags::FILL);
        panels.push(panel);
    }
    root.tree_mut()
        .node_mut(screen)
        .unwrap()
        .set_sizer(column);
    root
}

fn scripted_frames() -> Vec<FrameInput> {
    (0..32)
        .map(|i| FrameInput {
            mouse_position: Some(Vec2::new((i * 37 % 1280) as f32, (i * 23 % 720) as f32)),
            key_events: if i % 4 == 0 {
                vec![KeyEvent::new(Key::Tab)]
            } else {
                Vec::new()
            },
            ..FrameInput::default()
        })
        .collect()
}

fn frame_script(c: &mut Criterion) {
    let script = scripted_frames();
    c.bench_function("frame_script", |b| {
        b.iter(|| {
            let mut root = build_root();
            for input in black_box(&script) {
                root.update(input).unwrap();
                if !input.key_events.is_empty() {
                    root.focus_next().unwrap();
                }
            }
            black_box(root.render_list().len())
        });
    });
}

fn layout_pass(c: &mut Criterion) {
    c.bench_function("layout_pass", |b| {
        b.iter(|| {
            let mut root = build_root();
            let screen = root.root_node();
            root.tree_mut().mark_needing_layout(screen);
            root.tree_mut()
                .layout_min_size(screen, true)
                .unwrap();
            root.tree_mut()
                .assign_rect(screen, Rect::new(0.0, 0.0, 1280.0, 720.0))
                .unwrap();
            black_box(root.tree().node(screen).unwrap().size)
        });
    });
}

criterion_group!(benches, frame_script, layout_pass);
criterion_main!(benches);
