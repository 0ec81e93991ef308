//! End-to-end conversions through the built-in registry

mod common;

use common::{assert_contains, convert_everywhere, convert_source};
use insta::assert_snapshot;

const ADD_PY: &str = "def add(a: int, b: int) -> int:\n    return a + b\n";

const PERSON_JAVA: &str = "\
public class Person {
    private String name;
    private int age;

    public Person(String name, int age) {
        this.name = name;
        this.age = age;
    }
}
";

const ANIMALS_PY: &str = "\
class Animal:
    def speak(self) -> str:
        return \"...\"


class Dog(Animal):
    def fetch(self) -> str:
        return \"ball\"
";

#[test]
fn test_add_keeps_name_arity_and_integer_types_everywhere() {
    let expected = [
        ("rust", "pub fn add(a: i64, b: i64) -> i64 {"),
        ("go", "func Add(a int64, b int64) int64 {"),
        ("python", "def add(a: int, b: int) -> int:"),
        ("typescript", "function add(a: number, b: number): number {"),
        ("java", "public static long add(long a, long b) {"),
        ("kotlin", "fun add(a: Long, b: Long): Long {"),
    ];
    let conversions = convert_everywhere(ADD_PY, "python");
    for ((target, conversion), (expected_target, signature)) in conversions.iter().zip(expected) {
        assert_eq!(*target, expected_target);
        assert_contains(&conversion.text, signature);
        assert!(conversion.diagnostics.is_empty(), "{}: {}", target, conversion.diagnostics);
    }
}

#[test]
fn test_add_in_go_is_a_complete_file() {
    let conversion = convert_source(ADD_PY, "python", "go");
    assert_snapshot!(conversion.text, @r"
    package main

    func Add(a int64, b int64) int64 {
    	return a + b
    }
    ");
}

#[test]
fn test_add_in_kotlin() {
    let conversion = convert_source(ADD_PY, "py", "kt");
    assert_snapshot!(conversion.text, @r"
    fun add(a: Long, b: Long): Long {
        return a + b
    }
    ");
}

#[test]
fn test_record_members_and_accessors() {
    let rust = convert_source(PERSON_JAVA, "java", "rust").text;
    assert_contains(&rust, "pub struct Person {\n    name: String,\n    age: i32,\n}");
    assert_contains(&rust, "pub fn name(&self) -> &String {");
    assert_contains(&rust, "pub fn set_age(&mut self, value: i32) {");
    assert!(syn::parse_file(&rust).is_ok(), "{}", rust);

    let go = convert_source(PERSON_JAVA, "java", "go").text;
    assert_contains(&go, "\tname string\n");
    assert_contains(&go, "\tage  int32\n");
    assert_contains(&go, "func (p *Person) Name() string {");
    assert_contains(&go, "func (p *Person) SetAge(value int32) {");

    let python = convert_source(PERSON_JAVA, "java", "python").text;
    assert_contains(&python, "def __init__(self, name: str, age: int) -> None:");
    assert_contains(&python, "self._name = name");
    assert_contains(&python, "self._age = age");

    let typescript = convert_source(PERSON_JAVA, "java", "typescript").text;
    assert_contains(&typescript, "private name: string;");
    assert_contains(&typescript, "private age: number;");
    assert_contains(&typescript, "constructor(name: string, age: number) {");

    let kotlin = convert_source(PERSON_JAVA, "java", "kotlin").text;
    assert_contains(&kotlin, "var name: String");
    assert_contains(&kotlin, "var age: Int");
}

#[test]
fn test_record_to_java_from_python_gets_getters_and_setters() {
    let source = "\
class Person:
    def __init__(self, name: str, age: int):
        self.name = name
        self.age = age
";
    let java = convert_source(source, "python", "java").text;
    assert_contains(&java, "private String name;");
    assert_contains(&java, "private long age;");
    assert_contains(&java, "public String getName() {");
    assert_contains(&java, "public void setAge(long age) {");
}

#[test]
fn test_inheritance_is_composed_in_rust_and_embedded_in_go() {
    let rust = convert_source(ANIMALS_PY, "python", "rust");
    assert_contains(&rust.text, "struct Dog {\n    base: Animal,\n}");
    assert_contains(&rust.text, "pub fn speak(&self) -> String {\n        self.base.speak()\n    }");
    assert!(rust.diagnostics.has_warnings(), "the restructuring must be reported");
    assert!(syn::parse_file(&rust.text).is_ok(), "{}", rust.text);

    let go = convert_source(ANIMALS_PY, "python", "go");
    assert_contains(&go.text, "type Dog struct {\n\tAnimal\n}");
}

#[test]
fn test_inheritance_is_kept_where_the_target_has_it() {
    let java = convert_source(ANIMALS_PY, "python", "java").text;
    assert_contains(&java, "class Dog extends Animal {");

    let typescript = convert_source(ANIMALS_PY, "python", "typescript").text;
    assert_contains(&typescript, "class Dog extends Animal {");

    let python = convert_source(ANIMALS_PY, "python", "python").text;
    assert_contains(&python, "class Dog(Animal):");
}

#[test]
fn test_optional_list_of_string_keeps_every_layer() {
    let source = "\
from typing import List, Optional


def tags(values: Optional[List[str]]) -> Optional[List[str]]:
    return values
";
    let expected = [
        ("rust", "Option<Vec<String>>"),
        ("go", "*[]string"),
        ("python", "Optional[List[str]]"),
        ("typescript", "string[] | null"),
        ("java", "Optional<List<String>>"),
        ("kotlin", "List<String>?"),
    ];
    for ((target, conversion), (_, rendered)) in convert_everywhere(source, "python").iter().zip(expected) {
        let occurrences = conversion.text.matches(rendered).count();
        assert_eq!(occurrences, 2, "{} should render both parameter and return as {}:\n{}", target, rendered, conversion.text);
    }
}

#[test]
fn test_dynamic_values_stay_dynamic() {
    let source = "def identity(value):\n    return value\n";
    let typescript = convert_source(source, "python", "typescript").text;
    assert_contains(&typescript, "value: any");
    let go = convert_source(source, "python", "go").text;
    assert_contains(&go, "value interface{}");
}

#[test]
fn test_question_marked_field_is_optional_in_every_target() {
    let source = "interface Tagged {\n    tags?: string[];\n}\n";
    let expected = [
        ("rust", "tags: Option<Vec<String>>"),
        ("go", "*[]string"),
        ("python", "tags: Optional[List[str]] = None"),
        ("typescript", "tags?: string[]"),
        ("java", "Optional<List<String>> tags"),
        ("kotlin", "tags: List<String>? = null"),
    ];
    for ((target, conversion), (expected_target, rendered)) in convert_everywhere(source, "typescript").iter().zip(expected) {
        assert_eq!(*target, expected_target);
        assert_contains(&conversion.text, rendered);
    }
}

const GREETER_JAVA: &str = "\
public class Greeter {
    private String name;

    public Greeter(String name) {
        this.name = name;
    }

    public String greet() {
        return \"Hi \" + name;
    }
}
";

#[test]
fn test_bare_field_reference_reads_through_the_receiver() {
    let expected = [
        ("rust", "return \"Hi \" + self.name;"),
        ("go", "return \"Hi \" + g.name"),
        ("python", "return \"Hi \" + self._name"),
        ("typescript", "return \"Hi \" + this.name;"),
        ("java", "return \"Hi \" + this.name;"),
        ("kotlin", "return \"Hi \" + this.name"),
    ];
    for ((target, conversion), (_, line)) in convert_everywhere(GREETER_JAVA, "java").iter().zip(expected) {
        assert_contains(&conversion.text, line);
        assert!(!conversion.text.contains("+ name"), "{}:\n{}", target, conversion.text);
    }
}

const PEOPLE_PY: &str = "\
class Named:
    def __init__(self, name: str):
        self.name = name


class Aged:
    def __init__(self, age: int):
        self.age = age

    def older(self) -> int:
        return self.age + 1


class Person(Named, Aged):
    def greet(self) -> str:
        return \"Hi \" + self.name
";

#[test]
fn test_second_base_class_is_an_interface_in_java_and_kotlin() {
    let java = convert_source(PEOPLE_PY, "python", "java");
    assert_contains(&java.text, "class Person extends Named implements Aged {");
    assert_contains(&java.text, "interface Aged {");
    assert_contains(&java.text, "default long older() {");
    assert_eq!(java.text.matches("class Aged").count(), 0, "{}", java.text);

    let kotlin = convert_source(PEOPLE_PY, "python", "kotlin");
    assert_contains(&kotlin.text, "class Person(name: String, override var age: Long) : Named(name), Aged {");
    assert_contains(&kotlin.text, "interface Aged {\n    var age: Long");

    let typescript = convert_source(PEOPLE_PY, "python", "typescript");
    assert_contains(&typescript.text, "class Person extends Named implements Aged {");
    assert_contains(&typescript.text, "interface Aged {");
    assert!(typescript.diagnostics.has_warnings(), "{}", typescript.text);
}

#[test]
fn test_go_fields_line_up() {
    let go = convert_source(PERSON_JAVA, "java", "go");
    assert_snapshot!(go.text.lines().take(6).collect::<Vec<_>>().join("\n"), @r"
    package main

    type Person struct {
    	name string
    	age  int32
    }
    ");
}
