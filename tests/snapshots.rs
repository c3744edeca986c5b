use insta::assert_snapshot;

/// Snapshot of a small class's generated VM code — constructor field
/// allocation, a field accessor method, and the this-pointer protocol for
/// each (spec.md §4.3).
#[test]
fn point_class_generates_expected_vm_code() {
    let source = r#"
class Point {
    field int x, y;

    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        return this;
    }

    method int getX() {
        return x;
    }
}
"#;
    let vm = jackc::compile_class(source).unwrap();
    assert_snapshot!(vm.join("\n"), @r"
    function Point.new 0
    push constant 2
    call Memory.alloc 1
    pop pointer 0
    push argument 0
    pop this 0
    push argument 1
    pop this 1
    push pointer 0
    return
    function Point.getX 0
    push argument 0
    pop pointer 0
    push this 0
    return
    ");
}
