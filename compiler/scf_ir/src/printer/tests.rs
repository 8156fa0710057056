use pretty_assertions::assert_eq;

use crate::builder::Builder;
use crate::kind::{PrimOp, Ty};
use crate::Graph;

#[test]
fn prints_structured_loop() {
    let mut graph = Graph::new();
    let mut b = Builder::new(&mut graph);
    let zero = b.int(0);
    let trip = b.max_trip_count();
    let lp = b.while_loop(
        trip,
        &[zero],
        |b, carried| {
            let three = b.int(3);
            b.prim(PrimOp::Lt, &[carried[0], three])
        },
        |b, _, carried| {
            let one = b.int(1);
            vec![b.prim(PrimOp::Add, &[carried[0], one])]
        },
    );
    let result = b.graph().output(lp);
    b.ret(&[result]);

    let expected = "\
graph():
  %0 : int = const[0]()
  %1 : int = const[9223372036854775807]()
  %2 : int = loop(%1, %0)
    block1(%3 : int, %4 : int):
      %5 : int = const[1]()
      %6 : int = add(%4, %5)
      -> (%6)
    block2(%7 : int):
      %8 : int = const[3]()
      %9 : bool = lt(%7, %8)
      -> (%9)
  -> (%2)
";
    assert_eq!(graph.to_string(), expected);
}

#[test]
fn prints_if_and_guarded_loop() {
    let mut graph = Graph::new();
    let mut b = Builder::new(&mut graph);
    let flag = b.bool(true);
    let branch = b.if_else(flag, &[Ty::Int], |b| vec![b.int(1)], |b| vec![b.int(2)]);
    let start = b.graph().output(branch);
    let trip = b.int(4);
    b.guarded_loop(trip, flag, &[start], |_, _, carried| (flag, vec![carried[0]]));

    let expected = "\
graph():
  %0 : bool = const[true]()
  %1 : int = if(%0)
    block1():
      %2 : int = const[1]()
      -> (%2)
    block2():
      %3 : int = const[2]()
      -> (%3)
  %4 : int = const[4]()
  %5 : int = loop.guarded(%4, %0, %1)
    block3(%6 : int, %7 : int):
      -> (%0, %7)
  -> ()
";
    assert_eq!(graph.to_string(), expected);
}

#[test]
fn prints_detached_block() {
    let mut graph = Graph::new();
    let donor = graph.create_detached_block();
    let mut b = Builder::at_end(&mut graph, donor);
    let seven = b.int(7);
    b.ret(&[seven]);

    assert_eq!(
        graph.display_block(donor).to_string(),
        "block1():\n  %0 : int = const[7]()\n  -> (%0)\n"
    );
}
