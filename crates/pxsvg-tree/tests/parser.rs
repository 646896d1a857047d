use pxsvg_tree::{Document, Error, Node, Options, Paint, Size, Transform};

fn parse(svg: &str) -> Document {
    Document::from_str(svg, &Options::default()).unwrap()
}

fn first_path(group: &pxsvg_tree::Group) -> Option<&pxsvg_tree::Path> {
    for child in group.children() {
        match child {
            Node::Path(ref path) => return Some(path),
            Node::Group(ref g) => {
                if let Some(path) = first_path(g) {
                    return Some(path);
                }
            }
            Node::Use(ref u) => {
                if let Some(path) = first_path(u.root()) {
                    return Some(path);
                }
            }
            _ => {}
        }
    }

    None
}

#[test]
fn clippath_with_invalid_child() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 1 1'>
        <clipPath id='clip1'>
            <rect/>
        </clipPath>
        <rect clip-path='url(#clip1)' width='10' height='10'/>
    </svg>
    ";

    let doc = parse(svg);
    // clipPath is invalid and should be removed together with rect.
    assert_eq!(doc.root().has_children(), false);
}

#[test]
fn size_detection_1() {
    let doc = parse("<svg viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>");
    assert_eq!(doc.size(), Size::from_wh(10.0, 20.0));
}

#[test]
fn size_detection_2() {
    let doc = parse(
        "<svg width='30' height='40' viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>",
    );
    assert_eq!(doc.size(), Size::from_wh(30.0, 40.0));
}

#[test]
fn size_detection_3() {
    let doc = parse(
        "<svg width='50%' height='100%' viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>",
    );
    assert_eq!(doc.size(), Size::from_wh(5.0, 20.0));
}

#[test]
fn size_detection_4() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg'>
        <circle cx='18' cy='18' r='18'/>
    </svg>
    ";
    let doc = parse(svg);
    assert_eq!(doc.size(), Size::from_wh(36.0, 36.0));
    assert_eq!(
        doc.view_box().rect,
        pxsvg_tree::NonZeroRect::from_xywh(0.0, 0.0, 36.0, 36.0).unwrap()
    );
}

#[test]
fn size_detection_5() {
    // No size, no viewBox and no content.
    let doc = parse("<svg xmlns='http://www.w3.org/2000/svg'/>");
    assert_eq!(doc.size(), None);
}

#[test]
fn invalid_size_1() {
    let svg = "<svg width='0' height='0' viewBox='0 0 10 20' xmlns='http://www.w3.org/2000/svg'/>";
    let result = Document::from_str(svg, &Options::default());
    assert!(matches!(result, Err(Error::InvalidSize)));
}

#[test]
fn not_an_svg() {
    let result = Document::from_str("<html/>", &Options::default());
    assert!(matches!(result, Err(Error::UnsupportedVersion)));
}

#[test]
fn malformed_xml() {
    let result = Document::from_str("<svg xmlns='http://www.w3.org/2000/svg'>", &Options::default());
    assert!(matches!(result, Err(Error::Malformed(_))));
}

#[test]
fn not_utf8() {
    let result = Document::from_data(&[0x3c, 0xff, 0xfe, 0x3e], &Options::default());
    assert!(matches!(result, Err(Error::NotUtf8)));
}

#[test]
fn malformed_gzip() {
    let result = Document::from_data(&[0x1f, 0x8b, 0x00, 0x01], &Options::default());
    assert!(matches!(result, Err(Error::MalformedGZip)));
}

#[test]
fn document_is_send_and_sync() {
    fn ensure_send_and_sync<T: Send + Sync>() {}
    ensure_send_and_sync::<Document>();
}

#[test]
fn path_transform() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <path transform='translate(10)' d='M 0 0 L 10 10'/>
    </svg>
    ";

    let doc = parse(svg);
    assert_eq!(doc.root().children().len(), 1);

    let group = match doc.root().children()[0] {
        Node::Group(ref g) => g,
        _ => unreachable!(),
    };
    assert_eq!(group.transform(), Transform::from_translate(10.0, 0.0));
    assert!(matches!(group.children()[0], Node::Path(_)));
}

#[test]
fn plain_path_has_no_group() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <path d='M 0 0 L 10 10'/>
    </svg>
    ";

    let doc = parse(svg);
    assert!(matches!(doc.root().children()[0], Node::Path(_)));
}

#[test]
fn physical_units() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 200 200'>
        <rect width='1in' height='72pt'/>
    </svg>
    ";

    let doc = parse(svg);
    let path = first_path(doc.root()).unwrap();
    assert_eq!(path.bounding_box().width(), 96.0);
    assert_eq!(path.bounding_box().height(), 96.0);
}

#[test]
fn percent_units() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 200 100'>
        <rect width='50%' height='50%'/>
    </svg>
    ";

    let doc = parse(svg);
    let path = first_path(doc.root()).unwrap();
    assert_eq!(path.bounding_box().width(), 100.0);
    assert_eq!(path.bounding_box().height(), 50.0);
}

#[test]
fn style_cascade() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <style>rect { fill: red }</style>
        <rect width='10' height='10' fill='green' style='fill:blue'/>
        <rect width='10' height='10' fill='green'/>
    </svg>
    ";

    let doc = parse(svg);
    let colors: Vec<_> = doc
        .root()
        .children()
        .iter()
        .filter_map(|n| match n {
            Node::Path(ref p) => p.fill().map(|f| f.paint().clone()),
            _ => None,
        })
        .collect();

    assert_eq!(
        colors,
        vec![
            Paint::Color(pxsvg_tree::Color::new_rgb(0, 0, 255)),
            Paint::Color(pxsvg_tree::Color::new_rgb(255, 0, 0)),
        ]
    );
}

#[test]
fn fill_is_inherited() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <g fill='#00ff00' opacity='0.5'>
            <rect width='10' height='10'/>
        </g>
    </svg>
    ";

    let doc = parse(svg);
    let path = first_path(doc.root()).unwrap();
    assert_eq!(
        path.fill().unwrap().paint(),
        &Paint::Color(pxsvg_tree::Color::new_rgb(0, 255, 0))
    );
}

#[test]
fn use_self_reference() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <g id='g1'>
            <use xlink:href='#g1' xmlns:xlink='http://www.w3.org/1999/xlink'/>
        </g>
    </svg>
    ";

    let result = Document::from_str(svg, &Options::default());
    assert!(matches!(result, Err(Error::CyclicReference(ref id)) if id == "g1"));
}

#[test]
fn use_indirect_cycle() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <use id='a' href='#b'/>
        <use id='b' href='#a'/>
    </svg>
    ";

    let result = Document::from_str(svg, &Options::default());
    assert!(matches!(result, Err(Error::CyclicReference(_))));
}

#[test]
fn clip_path_self_reference() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <clipPath id='clip1' clip-path='url(#clip1)'>
            <rect width='10' height='10'/>
        </clipPath>
        <rect clip-path='url(#clip1)' width='10' height='10'/>
    </svg>
    ";

    let result = Document::from_str(svg, &Options::default());
    assert!(matches!(result, Err(Error::CyclicReference(_))));
}

#[test]
fn pattern_self_reference_is_parsed() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <pattern id='patt1' width='10' height='10' patternUnits='userSpaceOnUse'>
            <rect width='5' height='5' fill='url(#patt1)'/>
        </pattern>
        <rect width='10' height='10' fill='url(#patt1)'/>
    </svg>
    ";

    let doc = parse(svg);
    let path = first_path(doc.root()).unwrap();
    let id = match path.fill().unwrap().paint() {
        Paint::Server(id) => *id,
        _ => unreachable!(),
    };

    let pattern = match doc.paint_server(id) {
        Some(pxsvg_tree::PaintServer::Pattern(ref p)) => p,
        _ => unreachable!(),
    };

    // The pattern content points back to the pattern itself.
    let inner = first_path(pattern.root()).unwrap();
    assert_eq!(inner.fill().unwrap().paint(), &Paint::Server(id));
}

#[test]
fn too_deep() {
    let mut svg = String::from("<svg xmlns='http://www.w3.org/2000/svg'>");
    for _ in 0..150 {
        svg.push_str("<g>");
    }
    for _ in 0..150 {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");

    let result = Document::from_str(&svg, &Options::default());
    assert!(matches!(result, Err(Error::TooComplex)));
}

#[test]
fn switch_picks_first_passing_child() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <switch>
            <rect id='ru' systemLanguage='ru' width='10' height='10'/>
            <rect id='en' systemLanguage='en-US' width='10' height='10'/>
            <rect id='fallback' width='10' height='10'/>
        </switch>
    </svg>
    ";

    let doc = parse(svg);
    assert!(doc.node_by_id("en").is_some());
    assert!(doc.node_by_id("ru").is_none());
    assert!(doc.node_by_id("fallback").is_none());
}

#[test]
fn symbol_is_instantiated_by_use() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <symbol id='sym' overflow='visible'>
            <rect id='r' width='10' height='10'/>
        </symbol>
        <use href='#sym' x='20' y='30'/>
    </svg>
    ";

    let doc = parse(svg);
    let u = match doc.root().children()[0] {
        Node::Use(ref u) => u,
        _ => unreachable!(),
    };
    assert_eq!(u.transform(), Transform::from_translate(20.0, 30.0));

    // Instantiated content has no IDs, so look at the structure instead.
    let children = u.root().children();
    assert_eq!(children.len(), 1);
    match children[0] {
        Node::Path(ref p) => {
            assert_eq!(p.id(), "");
            assert_eq!(
                p.bounding_box(),
                pxsvg_tree::Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap()
            );
        }
        _ => panic!("expected a path"),
    }
}

#[test]
fn paint_order() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <rect width='10' height='10' stroke='black' paint-order='stroke'/>
    </svg>
    ";

    let doc = parse(svg);
    let path = first_path(doc.root()).unwrap();
    assert_eq!(path.paint_order(), pxsvg_tree::PaintOrder::StrokeAndFill);
}

#[test]
fn arcs_are_preserved() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <path d='M 10 10 A 5 5 0 0 1 20 10'/>
    </svg>
    ";

    let doc = parse(svg);
    let path = first_path(doc.root()).unwrap();
    assert!(path
        .data()
        .segments()
        .iter()
        .any(|s| matches!(s, pxsvg_tree::PathSegment::ArcTo { .. })));
    assert!(path
        .data()
        .simplified()
        .all(|s| !matches!(s, pxsvg_tree::PathSegment::ArcTo { .. })));
}

#[test]
fn text_spans() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <text x='10' y='20' font-size='16' text-anchor='middle'>
            Hello <tspan font-weight='bold'>world</tspan>
        </text>
    </svg>
    ";

    let doc = parse(svg);
    assert!(doc.has_text_nodes());

    let text = match doc.root().children()[0] {
        Node::Text(ref t) => t,
        _ => unreachable!(),
    };

    let spans = text.spans();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text(), "Hello ");
    assert_eq!(spans[0].x(), Some(10.0));
    assert_eq!(spans[0].y(), Some(20.0));
    assert_eq!(spans[0].font_size().get(), 16.0);
    assert_eq!(spans[0].anchor(), pxsvg_tree::TextAnchor::Middle);
    assert_eq!(spans[0].font().weight(), 400);
    assert_eq!(spans[1].text(), "world");
    assert_eq!(spans[1].x(), None);
    assert_eq!(spans[1].font().weight(), 700);
}

#[test]
fn embedded_svg_image() {
    // <svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'/>
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <image width='20' height='20' href='data:image/svg+xml;base64,PHN2ZyB4bWxucz0naHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmcnIHdpZHRoPScxMCcgaGVpZ2h0PScxMCcvPg=='/>
    </svg>
    ";

    let doc = parse(svg);
    let image = match doc.root().children()[0] {
        Node::Image(ref i) => i,
        _ => unreachable!(),
    };
    assert!(matches!(image.kind(), pxsvg_tree::ImageKind::SVG(_)));
    assert_eq!(image.view_box().rect.width(), 20.0);
}

#[test]
fn external_images_are_not_loaded_by_default() {
    let svg = "
    <svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
        <image width='20' height='20' href='image.png'/>
    </svg>
    ";

    let doc = parse(svg);
    assert!(!doc.root().has_children());
}
