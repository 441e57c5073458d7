//! Binding integration tests
//!
//! Whole documents read through the bundled grammar.

use pretty_assertions::assert_eq;
use rmlformat::types::{Color, Pose, Vector3};
use rmlformat::{Error, Node, Reader};

fn read(xml: &str) -> rmlformat::Result<rmlformat::Element> {
    Reader::new().read_str(xml, "binder_tests")
}

#[test]
fn test_world_with_lights_and_models() {
    let root = read(
        r#"<?xml version="1.0"?>
        <rml version="1.6">
          <world name="default">
            <gravity>0 0 -9.81</gravity>
            <light name="sun" type="directional">
              <cast_shadows>true</cast_shadows>
              <diffuse>0.8 0.8 0.8</diffuse>
              <direction>-0.5 0.1 -0.9</direction>
            </light>
            <model name="ground">
              <static>true</static>
              <link name="body"/>
            </model>
            <model name="box">
              <pose>0 0 0.5 0 0 0</pose>
              <link name="body">
                <inertial><mass>2</mass></inertial>
              </link>
            </model>
          </world>
        </rml>"#,
    )
    .unwrap();

    let world = root.element("world").unwrap();
    assert_eq!(world.get::<String>("name").unwrap(), "default");
    assert_eq!(world.get::<Vector3>("gravity").unwrap(), Vector3::new(0.0, 0.0, -9.81));
    // unset optional child reads its default
    assert_eq!(
        world.get::<Color>("ambient").unwrap(),
        Color::new(0.4, 0.4, 0.4, 1.0)
    );

    let light = world.element("light").unwrap();
    assert_eq!(light.get::<String>("type").unwrap(), "directional");
    assert!(light.get::<bool>("cast_shadows").unwrap());
    assert_eq!(light.get::<Color>("diffuse").unwrap().a, 1.0);

    let models: Vec<String> = world
        .elements("model")
        .map(|m| m.get::<String>("name").unwrap())
        .collect();
    assert_eq!(models, vec!["ground".to_string(), "box".to_string()]);

    let boxed = world.elements("model").nth(1).unwrap();
    assert_eq!(boxed.get::<Pose>("pose").unwrap(), Pose::new(0.0, 0.0, 0.5, 0.0, 0.0, 0.0));
    assert!(!boxed.get::<bool>("static").unwrap());
}

#[test]
fn test_unknown_content_is_skipped() {
    let root = read(
        r#"<rml version="1.6">
             <model name="m" colour="red">
               <sparkle>yes</sparkle>
               <link name="l"/>
             </model>
           </rml>"#,
    )
    .unwrap();

    let model = root.element("model").unwrap();
    assert!(!model.has_element("sparkle"));
    assert!(model.attribute("colour").is_none());
    assert!(model.has_element("link"));
}

#[test]
fn test_comma_decimal_is_a_parse_failure() {
    let err = read(
        r#"<rml version="1.6"><world name="w"><gravity>0 0 -9,8</gravity></world></rml>"#,
    )
    .unwrap_err();
    match err {
        Error::ParseFailure { key, value, type_name } => {
            assert_eq!(key, "gravity");
            assert_eq!(value, "0 0 -9,8");
            assert_eq!(type_name, "vector3");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_infinite_limits_are_accepted() {
    let root = read(
        r#"<rml version="1.6"><model name="m">
             <link name="a"/><link name="b"/>
             <joint name="j" type="prismatic">
               <parent>a</parent><child>b</child>
               <axis><xyz>1 0 0</xyz><limit><lower>-inf</lower><upper>inf</upper></limit></axis>
             </joint>
           </model></rml>"#,
    )
    .unwrap();

    let limit = root
        .element("model")
        .and_then(|m| m.element("joint"))
        .and_then(|j| j.element("axis"))
        .and_then(|a| a.element("limit"))
        .unwrap();
    assert_eq!(limit.get::<f64>("upper").unwrap(), f64::INFINITY);
    assert_eq!(limit.get::<f64>("lower").unwrap(), f64::NEG_INFINITY);
}

#[test]
fn test_joint_requirements_depend_on_type() {
    let revolute = read(
        r#"<rml version="1.6"><model name="m">
             <joint name="j" type="revolute"><parent>a</parent><child>b</child></joint>
           </model></rml>"#,
    );
    assert!(matches!(revolute, Err(Error::MissingRequiredElement { .. })));

    let ball = read(
        r#"<rml version="1.6"><model name="m">
             <joint name="j" type="ball"><parent>a</parent><child>b</child></joint>
           </model></rml>"#,
    )
    .unwrap();
    let joint = ball.element("model").unwrap().element("joint").unwrap();
    assert!(joint.has_element("axis"));
}

#[test]
fn test_joint_parent_is_required() {
    let err = read(
        r#"<rml version="1.6"><model name="m">
             <joint name="j" type="fixed"><child>b</child><axis><xyz>1 0 0</xyz></axis></joint>
           </model></rml>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingRequiredElement { ref element, .. } if element == "parent"
    ));
}

#[test]
fn test_plugin_contents_are_copied() {
    let root = read(
        r#"<rml version="1.6"><model name="m">
             <plugin name="ctrl" filename="libctrl.so">
               <gain kind="p">2.5</gain>
               <topics><topic>cmd</topic><topic>odom</topic></topics>
             </plugin>
           </model></rml>"#,
    )
    .unwrap();

    let plugin = root.element("model").unwrap().element("plugin").unwrap();
    assert_eq!(plugin.get::<String>("filename").unwrap(), "libctrl.so");

    let gain = plugin.element("gain").unwrap();
    assert_eq!(gain.get::<String>("").unwrap(), "2.5");
    assert_eq!(gain.get::<String>("kind").unwrap(), "p");
    assert_eq!(plugin.element("topics").unwrap().elements("topic").count(), 2);
}

#[test]
fn test_plugin_requires_filename() {
    let err = read(
        r#"<rml version="1.6"><model name="m"><plugin name="ctrl"/></model></rml>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::RequiredAttributeUnset { ref key, .. } if key == "filename"
    ));
}

#[test]
fn test_older_document_is_converted() {
    let root = read(
        r#"<rml version="1.5">
             <world name="w">
               <model name="m">
                 <allow_auto_disable_links>false</allow_auto_disable_links>
               </model>
             </world>
             <light name="lamp"/>
             <model name="arm">
               <link name="a"/><link name="b"/>
               <joint name="j" type="fixed">
                 <parent>a</parent><child>b</child>
                 <axis><xyz>0 1 0</xyz><use_parent_model_frame>true</use_parent_model_frame></axis>
               </joint>
             </model>
           </rml>"#,
    )
    .unwrap();

    assert_eq!(root.original_version(), "1.5");
    assert_eq!(root.get::<String>("version").unwrap(), "1.6");

    let world_model = root.element("world").unwrap().element("model").unwrap();
    assert!(!world_model.get::<bool>("allow_auto_disable").unwrap());

    let light = root.element("light").unwrap();
    assert!(light.attribute("type").unwrap().is_set());
    assert_eq!(light.get::<String>("type").unwrap(), "point");
    assert_eq!(light.original_version(), "1.5");
}

#[test]
fn test_bound_tree_reads_back() {
    let reader = Reader::new();
    let first = reader
        .read_str(
            r#"<rml version="1.6"><model name="m"><static>true</static><link name="l"><pose>1 2 3 0 0 0</pose></link></model></rml>"#,
            "first",
        )
        .unwrap();

    let second = reader.read_str(&first.to_xml_string(), "second").unwrap();
    let model = second.element("model").unwrap();
    assert!(model.get::<bool>("static").unwrap());
    assert_eq!(
        model.element("link").unwrap().get::<Pose>("pose").unwrap(),
        Pose::new(1.0, 2.0, 3.0, 0.0, 0.0, 0.0)
    );
}

#[test]
fn test_read_file_sets_source() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("lamp.rml");
    std::fs::write(&path, r#"<rml version="1.6"><light name="lamp"/></rml>"#).unwrap();

    let root = Reader::new().read_file(&path).unwrap();
    assert_eq!(root.include_source(), Some(path.as_path()));
    assert!(root.has_element("light"));
}

#[test]
fn test_missing_file() {
    let err = Reader::new()
        .read_file("/nonexistent/dir/world.rml")
        .unwrap_err();
    assert!(matches!(err, Error::Io(_) | Error::Resource(_)));
}
