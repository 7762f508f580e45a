// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use qdt::{Encoder, NodeId, Step, Tree};
use qdt_fdt::header::FdtHeader;
use rstest::rstest;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Begin(String),
    Property(String, Vec<u8>),
    End,
}

/// Records events and optionally fails on the n-th one.
#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
    fail_at: Option<(usize, qdt_fdt::Error)>,
    calls: usize,
}

impl Recorder {
    fn failing_at(index: usize, code: qdt_fdt::Error) -> Self {
        Self {
            fail_at: Some((index, code)),
            ..Self::default()
        }
    }

    fn record(&mut self, event: Event) -> qdt_fdt::Result<()> {
        let index = self.calls;
        self.calls += 1;
        match self.fail_at {
            Some((fail_index, code)) if fail_index == index => Err(code),
            _ => {
                self.events.push(event);
                Ok(())
            }
        }
    }
}

impl Encoder for Recorder {
    fn begin_node(&mut self, name: &str) -> qdt_fdt::Result<()> {
        self.record(Event::Begin(name.to_owned()))
    }

    fn property(&mut self, name: &str, value: &[u8]) -> qdt_fdt::Result<()> {
        self.record(Event::Property(name.to_owned(), value.to_vec()))
    }

    fn end_node(&mut self) -> qdt_fdt::Result<()> {
        self.record(Event::End)
    }
}

fn begin(name: &str) -> Event {
    Event::Begin(name.to_owned())
}

fn prop(name: &str, value: &[u8]) -> Event {
    Event::Property(name.to_owned(), value.to_vec())
}

/// A root with a single child carrying a single property.
fn single_child_tree() -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.new_root();
    let cpus = tree.add_subnode(root, "cpus");
    tree.node_mut(cpus).set_property_string("compatible", "a");
    (tree, root)
}

#[rustfmt::skip]
const SINGLE_CHILD_DTB: &[u8] = &[
    // header
    0xd0, 0x0d, 0xfe, 0xed, // magic
    0x00, 0x00, 0x00, 0x73, // totalsize = 115
    0x00, 0x00, 0x00, 0x38, // off_dt_struct = 56
    0x00, 0x00, 0x00, 0x68, // off_dt_strings = 104
    0x00, 0x00, 0x00, 0x28, // off_mem_rsvmap = 40
    0x00, 0x00, 0x00, 0x11, // version = 17
    0x00, 0x00, 0x00, 0x10, // last_comp_version = 16
    0x00, 0x00, 0x00, 0x00, // boot_cpuid_phys = 0
    0x00, 0x00, 0x00, 0x0b, // size_dt_strings = 11
    0x00, 0x00, 0x00, 0x30, // size_dt_struct = 48
    // empty memory reservation map
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // / {
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    //     cpus {
    0x00, 0x00, 0x00, 0x01, b'c', b'p', b'u', b's',
    0x00, 0x00, 0x00, 0x00,
    //         compatible = "a";
    0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x02,
    0x00, 0x00, 0x00, 0x00, b'a', 0x00, 0x00, 0x00,
    //     };
    0x00, 0x00, 0x00, 0x02,
    // };
    0x00, 0x00, 0x00, 0x02,
    // FDT_END
    0x00, 0x00, 0x00, 0x09,
    // strings
    b'c', b'o', b'm', b'p', b'a', b't', b'i', b'b', b'l', b'e', 0x00,
];

#[test]
fn single_child_blob() {
    let (tree, root) = single_child_tree();
    let dtb = tree.flatten(root, 0x100).unwrap();

    assert_eq!(dtb.len(), 0x100);
    assert_eq!(&dtb[..SINGLE_CHILD_DTB.len()], SINGLE_CHILD_DTB);
    assert!(dtb[SINGLE_CHILD_DTB.len()..].iter().all(|&b| b == 0));
}

#[rstest]
#[case(SINGLE_CHILD_DTB.len(), None)]
#[case(SINGLE_CHILD_DTB.len() - 1, Some(Step::Finish))]
#[case(80, Some(Step::Property))]
#[case(70, Some(Step::BeginNode))]
#[case(16, Some(Step::Create))]
fn buffer_sizes(#[case] bufsize: usize, #[case] failing_step: Option<Step>) {
    let (tree, root) = single_child_tree();
    match (tree.flatten(root, bufsize), failing_step) {
        (Ok(dtb), None) => {
            assert_eq!(dtb.len(), bufsize);
            let header = FdtHeader::from_blob(&dtb).unwrap();
            assert_eq!(header.totalsize() as usize, SINGLE_CHILD_DTB.len());
        }
        (Err(err), Some(step)) => {
            assert_eq!(err.step(), step);
            assert_eq!(err.code(), qdt_fdt::Error::NoSpace);
        }
        (result, expected) => panic!("unexpected result {result:?}, expected {expected:?}"),
    }
}

#[test]
fn events_follow_insertion_order() {
    let mut tree = Tree::new();
    let root = tree.new_root();
    tree.node_mut(root).set_property_cells("#address-cells", &[2]);
    tree.node_mut(root).set_property_string("model", "virt");
    let memory = tree.add_subnode(root, "memory@40000000");
    let cpus = tree.add_subnode(root, "cpus");
    let cpu1 = tree.add_subnode(cpus, "cpu@1");
    let cpu0 = tree.add_subnode(cpus, "cpu@0");
    tree.node_mut(cpu1).set_property_cells("reg", &[1]);
    tree.node_mut(cpu0).set_property_cells("reg", &[0]);
    tree.node_mut(memory).set_property_empty("dma-coherent");
    // Re-setting moves the property to the end.
    tree.node_mut(root).set_property_cells("#address-cells", &[1]);

    let mut recorder = Recorder::default();
    tree.flatten_into(root, &mut recorder).unwrap();

    assert_eq!(
        recorder.events,
        [
            begin(""),
            prop("model", b"virt\0"),
            prop("#address-cells", &[0, 0, 0, 1]),
            begin("memory@40000000"),
            prop("dma-coherent", &[]),
            Event::End,
            begin("cpus"),
            begin("cpu@1"),
            prop("reg", &[0, 0, 0, 1]),
            Event::End,
            begin("cpu@0"),
            prop("reg", &[0, 0, 0, 0]),
            Event::End,
            Event::End,
            Event::End,
        ]
    );
}

#[test]
fn duplicate_siblings_are_all_emitted() {
    let mut tree = Tree::new();
    let root = tree.new_root();
    tree.add_subnode(root, "dup");
    tree.add_subnode(root, "dup");

    let mut recorder = Recorder::default();
    tree.flatten_into(root, &mut recorder).unwrap();
    assert_eq!(
        recorder.events,
        [begin(""), begin("dup"), Event::End, begin("dup"), Event::End, Event::End]
    );
}

#[rstest]
#[case(0, Step::BeginNode)]
#[case(1, Step::BeginNode)]
#[case(2, Step::Property)]
#[case(3, Step::EndNode)]
#[case(4, Step::EndNode)]
fn first_failure_stops_the_walk(#[case] index: usize, #[case] step: Step) {
    let (tree, root) = single_child_tree();
    let mut recorder = Recorder::failing_at(index, qdt_fdt::Error::BadStructure);

    let err = tree.flatten_into(root, &mut recorder).unwrap_err();
    assert_eq!(err.step(), step);
    assert_eq!(err.code(), qdt_fdt::Error::BadStructure);
    assert_eq!(recorder.calls, index + 1);
    assert_eq!(recorder.events.len(), index);
}

#[test]
#[should_panic(expected = "flatten() requires a root node, but /cpus has a parent")]
fn flatten_non_root() {
    let (tree, root) = single_child_tree();
    let cpus = tree.get_node(root, "/cpus").unwrap();
    let _ = tree.flatten(cpus, 0x100);
}

#[test]
#[should_panic(expected = "flatten_into() requires a root node")]
fn flatten_into_non_root() {
    let (tree, root) = single_child_tree();
    let cpus = tree.get_node(root, "/cpus").unwrap();
    let _ = tree.flatten_into(cpus, &mut Recorder::default());
}

#[test]
fn separate_roots_flatten_separately() {
    let mut tree = Tree::new();
    let first = tree.new_root();
    let second = tree.new_node("other");
    tree.add_subnode(second, "child");

    let mut recorder = Recorder::default();
    tree.flatten_into(first, &mut recorder).unwrap();
    assert_eq!(recorder.events, [begin(""), Event::End]);
}
