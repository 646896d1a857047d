use once_cell::sync::Lazy;
use rgb::{FromSlice, RGBA8};

use pxsvg::{Options, RenderError, Transform, Tree};

static OPTIONS: Lazy<Options> = Lazy::new(Options::default);

fn parse(text: &str) -> Tree {
    Tree::from_str(text, &OPTIONS).unwrap()
}

fn render(tree: &Tree, ts: Transform, width: u32, height: u32) -> Vec<u8> {
    let mut buf = vec![0; width as usize * height as usize * 4];
    tree.render(ts, width, height, &mut buf).unwrap();
    buf
}

fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> RGBA8 {
    buf.as_rgba()[(y * width + x) as usize]
}

#[test]
fn rect_round_trip() {
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>
            <rect x='10' y='10' width='50' height='50' fill='#ff0000'/>
        </svg>",
    );

    let buf = render(&tree, Transform::default(), 100, 100);
    for y in 0..100 {
        for x in 0..100 {
            let expected = if (10..60).contains(&x) && (10..60).contains(&y) {
                RGBA8::new(255, 0, 0, 255)
            } else {
                RGBA8::new(0, 0, 0, 0)
            };

            assert_eq!(pixel(&buf, 100, x, y), expected, "at {}x{}", x, y);
        }
    }
}

#[test]
fn idempotence() {
    let text = "<svg xmlns='http://www.w3.org/2000/svg' width='64' height='64'>
        <linearGradient id='lg'>
            <stop offset='0' stop-color='gold'/>
            <stop offset='1' stop-color='teal' stop-opacity='0.5'/>
        </linearGradient>
        <circle cx='32' cy='32' r='20' fill='url(#lg)' stroke='black' stroke-dasharray='3 2'/>
        <path d='M 4 60 Q 32 0 60 60' fill='none' stroke='navy' stroke-width='3'
              stroke-linejoin='round' stroke-linecap='round'/>
    </svg>";

    let a = render(&parse(text), Transform::default(), 64, 64);
    let b = render(&parse(text), Transform::default(), 64, 64);
    assert!(a == b);
}

#[test]
fn buffer_is_overwritten() {
    let tree = parse("<svg xmlns='http://www.w3.org/2000/svg' width='4' height='4'/>");
    let mut buf = vec![0xff; 4 * 4 * 4];
    tree.render(Transform::default(), 4, 4, &mut buf).unwrap();
    assert!(buf.iter().all(|v| *v == 0));
}

#[test]
fn image_size() {
    let tree = parse("<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 30 40'/>");
    assert_eq!(tree.image_size(), (30.0, 40.0));

    let tree = parse("<svg xmlns='http://www.w3.org/2000/svg'/>");
    assert_eq!(tree.size(), None);
    assert_eq!(tree.image_size(), (0.0, 0.0));
}

#[test]
fn cyclic_use() {
    let result = Tree::from_str(
        "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>
            <use id='a' href='#b'/>
            <use id='b' href='#a'/>
        </svg>",
        &OPTIONS,
    );

    assert!(matches!(
        result,
        Err(pxsvg::Error::Parse(pxsvg::pxsvg_tree::Error::CyclicReference(_)))
    ));
}

#[test]
fn malformed_input() {
    assert!(Tree::from_data(b"<svg", &OPTIONS).is_err());
    assert!(Tree::from_data(b"\xff\xfe", &OPTIONS).is_err());
}

#[test]
fn render_errors() {
    let tree = parse("<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'/>");

    let mut buf = vec![0; 10 * 10 * 4 - 1];
    assert_eq!(
        tree.render(Transform::default(), 10, 10, &mut buf),
        Err(RenderError::BufferTooSmall)
    );
    assert_eq!(
        tree.render(Transform::default(), 10, 0, &mut buf),
        Err(RenderError::InvalidSize)
    );
}

#[test]
fn gradient_is_monotonic() {
    // Decreasing and out of range offsets are clamped.
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='1'>
            <linearGradient id='lg'>
                <stop offset='-1' stop-color='black'/>
                <stop offset='0.6' stop-color='#808080'/>
                <stop offset='0.4' stop-color='#808080'/>
                <stop offset='2' stop-color='white'/>
            </linearGradient>
            <rect width='100' height='1' fill='url(#lg)'/>
        </svg>",
    );

    let buf = render(&tree, Transform::default(), 100, 1);
    let pixels = buf.as_rgba();
    for pair in pixels.windows(2) {
        assert!(pair[0].r <= pair[1].r);
        assert_eq!(pair[1].a, 255);
    }

    assert!(pixels[0].r < 10);
    assert!(pixels[99].r > 245);
}

#[test]
fn premultiplied_output() {
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>
            <radialGradient id='rg'>
                <stop offset='0' stop-color='yellow' stop-opacity='0.3'/>
                <stop offset='1' stop-color='purple' stop-opacity='0.9'/>
            </radialGradient>
            <rect width='20' height='20' fill='url(#rg)' opacity='0.7'/>
            <circle cx='10' cy='10' r='7' fill='white' fill-opacity='0.2'/>
        </svg>",
    );

    let buf = render(&tree, Transform::default(), 20, 20);
    for p in buf.as_rgba() {
        assert!(p.r <= p.a && p.g <= p.a && p.b <= p.a, "{:?}", p);
    }
}

#[test]
fn scaled_rendering() {
    let text = "<svg xmlns='http://www.w3.org/2000/svg' width='50' height='50'>
        <rect x='5' y='5' width='20' height='30' fill='green'/>
        <circle cx='30' cy='30' r='15' fill='blue' fill-opacity='0.5'/>
    </svg>";
    let tree = parse(text);

    let small = render(&tree, Transform::default(), 50, 50);
    let big = render(&tree, Transform::from_row(2.0, 0.0, 0.0, 2.0, 0.0, 0.0), 100, 100);

    let mut total_diff = 0u32;
    for y in 0..50 {
        for x in 0..50 {
            let mut sum = [0u32; 4];
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let p = pixel(&big, 100, x * 2 + dx, y * 2 + dy);
                sum[0] += p.r as u32;
                sum[1] += p.g as u32;
                sum[2] += p.b as u32;
                sum[3] += p.a as u32;
            }

            let p = pixel(&small, 50, x, y);
            for (avg, v) in sum.iter().map(|s| s / 4).zip([p.r, p.g, p.b, p.a]) {
                let diff = (avg as i32 - v as i32).unsigned_abs();
                assert!(diff <= 64, "at {}x{}", x, y);
                total_diff += diff;
            }
        }
    }

    assert!(total_diff as f32 / (50.0 * 50.0 * 4.0) < 2.0);
}

#[test]
fn cyclic_pattern() {
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>
            <pattern id='patt1' width='10' height='10' patternUnits='userSpaceOnUse'>
                <rect width='5' height='5' fill='url(#patt1)'/>
            </pattern>
            <rect width='20' height='10' fill='url(#patt1)'/>
            <rect y='10' width='20' height='10' fill='green'/>
        </svg>",
    );

    let buf = render(&tree, Transform::default(), 20, 20);
    assert_eq!(pixel(&buf, 20, 5, 5), RGBA8::new(0, 0, 0, 0));
    assert_eq!(pixel(&buf, 20, 5, 15), RGBA8::new(0, 128, 0, 255));
}

#[test]
fn fill_rules() {
    let path = "M 0 0 L 20 0 L 20 20 L 0 20 Z M 5 5 L 15 5 L 15 15 L 5 15 Z";
    let text = |rule: &str| {
        format!(
            "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>
                <path d='{}' fill-rule='{}'/>
            </svg>",
            path, rule
        )
    };

    let buf = render(&parse(&text("nonzero")), Transform::default(), 20, 20);
    assert_eq!(pixel(&buf, 20, 10, 10).a, 255);
    assert_eq!(pixel(&buf, 20, 2, 2).a, 255);

    let buf = render(&parse(&text("evenodd")), Transform::default(), 20, 20);
    assert_eq!(pixel(&buf, 20, 10, 10).a, 0);
    assert_eq!(pixel(&buf, 20, 2, 2).a, 255);
}

#[test]
fn stroke_caps() {
    let text = |cap: &str| {
        format!(
            "<svg xmlns='http://www.w3.org/2000/svg' width='40' height='20'>
                <path d='M 10 10 L 30 10' stroke='black' stroke-width='4' stroke-linecap='{}'/>
            </svg>",
            cap
        )
    };

    let buf = render(&parse(&text("butt")), Transform::default(), 40, 20);
    assert_eq!(pixel(&buf, 40, 20, 10).a, 255);
    assert_eq!(pixel(&buf, 40, 9, 10).a, 0);

    let buf = render(&parse(&text("square")), Transform::default(), 40, 20);
    assert_eq!(pixel(&buf, 40, 9, 10).a, 255);
    assert_eq!(pixel(&buf, 40, 30, 9).a, 255);
    assert_eq!(pixel(&buf, 40, 33, 10).a, 0);
}

#[test]
fn clip_path() {
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>
            <clipPath id='clip' clipPathUnits='objectBoundingBox'>
                <rect width='0.5' height='1'/>
            </clipPath>
            <rect x='4' y='4' width='12' height='12' fill='blue' clip-path='url(#clip)'/>
        </svg>",
    );

    let buf = render(&tree, Transform::default(), 20, 20);
    assert_eq!(pixel(&buf, 20, 6, 10), RGBA8::new(0, 0, 255, 255));
    assert_eq!(pixel(&buf, 20, 12, 10).a, 0);
    assert_eq!(pixel(&buf, 20, 2, 2).a, 0);
}

#[test]
fn shape_rendering() {
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>
            <circle cx='10' cy='10' r='7.3' shape-rendering='crispEdges'/>
        </svg>",
    );

    let buf = render(&tree, Transform::default(), 20, 20);
    assert!(buf.as_rgba().iter().all(|p| p.a == 0 || p.a == 255));
}

#[test]
fn coverage_matches_reference() {
    let tree = parse(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>
            <circle cx='50' cy='50' r='30.5'/>
            <path d='M 10 90 L 50 60 L 90 95 Z'/>
        </svg>",
    );
    let buf = render(&tree, Transform::default(), 100, 100);

    let mut reference = tiny_skia::Pixmap::new(100, 100).unwrap();
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;

    let circle = tiny_skia::PathBuilder::from_circle(50.0, 50.0, 30.5).unwrap();
    let triangle = {
        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(10.0, 90.0);
        pb.line_to(50.0, 60.0);
        pb.line_to(90.0, 95.0);
        pb.close();
        pb.finish().unwrap()
    };

    for path in [circle, triangle] {
        reference.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    let mut total = 0u32;
    for (a, b) in buf.as_rgba().iter().zip(reference.data().as_rgba()) {
        let diff = (a.a as i32 - b.a as i32).unsigned_abs();
        assert!(diff < 64);
        total += diff;
    }

    assert!((total as f32 / 10_000.0) < 3.0);
}
