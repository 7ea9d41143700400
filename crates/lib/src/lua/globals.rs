//! The `mk` global table.
//!
//! Everything a rules script can do goes through here: rule construction,
//! link aliases, variables, file loading, and the path helpers. Outputs
//! and inputs accept either a list table or a single whitespace-separated
//! string; commands are trailing string arguments.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use mlua::Variadic;
use mlua::prelude::*;

use crate::error::RuleError;
use crate::lua::loaders;
use crate::path::{normalize_filename, split_filename};
use crate::project::{Project, to_list};

/// Coerce a Lua argument into a word list: nil is empty, a string is
/// whitespace-split, a table is taken element by element.
fn value_to_list(value: &LuaValue) -> LuaResult<Vec<String>> {
  match value {
    LuaValue::Nil => Ok(Vec::new()),
    LuaValue::String(s) => Ok(to_list(&s.to_str()?)),
    LuaValue::Table(t) => {
      let mut items = Vec::new();
      for item in t.clone().sequence_values::<String>() {
        items.push(item?);
      }
      Ok(items)
    }
    other => Err(LuaError::external(format!(
      "expected a string or a list of strings, got {}",
      other.type_name()
    ))),
  }
}

/// Split every variadic argument, so `"libfoo.a -lpthread"` works the
/// same as `"libfoo.a", "-lpthread"`.
fn words(items: &[String]) -> Vec<String> {
  items.iter().flat_map(|item| to_list(item)).collect()
}

fn scopes_to_maps(scopes: Variadic<LuaTable>) -> LuaResult<Vec<BTreeMap<String, String>>> {
  let mut maps = Vec::new();
  for table in scopes.iter() {
    let mut map = BTreeMap::new();
    for pair in table.clone().pairs::<String, String>() {
      let (k, v) = pair?;
      map.insert(k, v);
    }
    maps.push(map);
  }
  Ok(maps)
}

fn list_to_table(lua: &Lua, items: &[String]) -> LuaResult<LuaTable> {
  let table = lua.create_table()?;
  for (i, item) in items.iter().enumerate() {
    table.set(i + 1, item.as_str())?;
  }
  Ok(table)
}

/// Resolve a script-supplied path against the current `IN` directory.
/// Absolute paths stay absolute.
fn resolve_in(project: &Project, path: &str) -> String {
  normalize_filename(&[&project.vars.get("IN"), path])
}

/// Register the `mk` global table in the Lua runtime.
pub fn register_globals(lua: &Lua, project: Rc<RefCell<Project>>) -> LuaResult<()> {
  let mk = lua.create_table()?;

  // ---- rule constructors ----

  {
    let project = project.clone();
    mk.set(
      "generate",
      lua.create_function(
        move |_, (outputs, inputs, commands): (LuaValue, LuaValue, Variadic<String>)| {
          let outputs = value_to_list(&outputs)?;
          let inputs = value_to_list(&inputs)?;
          project
            .borrow_mut()
            .generate(&outputs, &inputs, &commands)
            .map_err(LuaError::external)
        },
      )?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "generate_unique",
      lua.create_function(
        move |_, (outputs, inputs, commands): (LuaValue, LuaValue, Variadic<String>)| {
          let outputs = value_to_list(&outputs)?;
          let inputs = value_to_list(&inputs)?;
          project
            .borrow_mut()
            .generate_unique(&outputs, &inputs, &commands)
            .map_err(LuaError::external)
        },
      )?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "generate_copy",
      lua.create_function(move |_, (dst, src): (String, String)| {
        project.borrow_mut().generate_copy(&dst, &src).map_err(LuaError::external)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "generate_anonymous",
      lua.create_function(
        move |_, (ext, inputs, commands): (String, LuaValue, Variadic<String>)| {
          let inputs = value_to_list(&inputs)?;
          project
            .borrow_mut()
            .generate_anonymous(&ext, &inputs, &commands)
            .map_err(LuaError::external)
        },
      )?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "generate_directory",
      lua.create_function(move |_, dir: String| {
        project.borrow_mut().generate_directory(&dir).map_err(LuaError::external)
      })?,
    )?;
  }

  // ---- link aliases and rule attributes ----

  {
    let project = project.clone();
    mk.set(
      "rule_add_link",
      lua.create_function(move |_, (name, items): (String, Variadic<String>)| {
        project
          .borrow_mut()
          .rule_add_link(&name, &words(&items))
          .map_err(LuaError::external)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_flatten_aliases",
      lua.create_function(move |lua, items: LuaValue| {
        let items = value_to_list(&items)?;
        let flat = project.borrow().rule_flatten_aliases(&items);
        list_to_table(lua, &flat)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_get_link_inputs",
      lua.create_function(move |lua, items: LuaValue| {
        let items = value_to_list(&items)?;
        let expanded = project.borrow().rule_get_link_inputs(&items);
        list_to_table(lua, &expanded)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_get_inputs",
      lua.create_function(move |lua, name: String| {
        let inputs = project.borrow().rule_get_inputs(&name).map_err(LuaError::external)?;
        list_to_table(lua, &inputs)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_phony",
      lua.create_function(move |_, name: String| {
        project.borrow_mut().rule_set_phony(&name).map_err(LuaError::external)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_precious",
      lua.create_function(move |_, name: String| {
        project.borrow_mut().rule_set_precious(&name).map_err(LuaError::external)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_priority",
      lua.create_function(move |_, (name, priority): (String, i32)| {
        project
          .borrow_mut()
          .rule_set_priority(&name, priority)
          .map_err(LuaError::external)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_info",
      lua.create_function(move |_, (name, info): (String, String)| {
        project.borrow_mut().rule_set_info(&name, &info).map_err(LuaError::external)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "rule_comment",
      lua.create_function(move |_, (name, comment): (String, String)| {
        project
          .borrow_mut()
          .rule_add_comment(&name, &comment)
          .map_err(LuaError::external)
      })?,
    )?;
  }

  // ---- variables ----

  {
    let project = project.clone();
    mk.set(
      "add_variable",
      lua.create_function(move |_, (name, default): (String, Option<String>)| {
        Ok(project.borrow_mut().vars.add(&name, &default.unwrap_or_default()))
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "set_variable",
      lua.create_function(move |_, (name, value): (String, String)| {
        project.borrow_mut().vars.set(&name, &value);
        Ok(())
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "get_variable",
      lua.create_function(move |_, (name, scopes): (String, Variadic<LuaTable>)| {
        let maps = scopes_to_maps(scopes)?;
        let refs: Vec<&BTreeMap<String, String>> = maps.iter().collect();
        Ok(project.borrow().vars.get_in(&name, &refs))
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "get_variable_merge",
      lua.create_function(move |_, (name, scopes): (String, Variadic<LuaTable>)| {
        let maps = scopes_to_maps(scopes)?;
        let refs: Vec<&BTreeMap<String, String>> = maps.iter().collect();
        Ok(project.borrow().vars.get_merge(&name, &refs))
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "add_to_variable",
      lua.create_function(move |_, (name, values): (String, Variadic<String>)| {
        project.borrow_mut().vars.append(&name, &words(&values));
        Ok(())
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "add_directory_variable",
      lua.create_function(move |_, name: String| {
        project.borrow_mut().vars.add_directory(&name);
        Ok(())
      })?,
    )?;
  }

  // mk.var reads and writes the store directly.
  let var = lua.create_table()?;
  let var_mt = lua.create_table()?;
  {
    let project = project.clone();
    var_mt.set(
      "__index",
      lua.create_function(move |_, (_, name): (LuaTable, String)| Ok(project.borrow().vars.get(&name)))?,
    )?;
  }
  {
    let project = project.clone();
    var_mt.set(
      "__newindex",
      lua.create_function(move |_, (_, name, value): (LuaTable, String, String)| {
        project.borrow_mut().vars.set(&name, &value);
        Ok(())
      })?,
    )?;
  }
  var.set_metatable(Some(var_mt))?;
  mk.set("var", var)?;

  // ---- loading ----

  {
    let project = project.clone();
    mk.set(
      "load_file",
      lua.create_function(move |lua, file: String| {
        let path = {
          let mut p = project.borrow_mut();
          let path = resolve_in(&p, &file);
          p.register_input(&path);
          path
        };
        loaders::load_file(lua, &path)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "load_directory",
      lua.create_function(move |lua, dir: String| {
        let canon = normalize_filename(&[&dir]);
        if canon.starts_with('/') || canon == ".." || canon.starts_with("../") {
          return Err(LuaError::external(RuleError::EscapingDirectory(dir)));
        }
        let (path, scope) = {
          let mut p = project.borrow_mut();
          let infile = p.vars.add("INFILE", "Rules.lua");
          let path = normalize_filename(&[&p.vars.get("IN"), &canon, &infile]);
          p.register_input(&path);
          let scope = p.vars.enter_directory(&canon);
          (path, scope)
        };
        let result = loaders::load_file(lua, &path);
        project.borrow_mut().vars.leave_directory(scope);
        result
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "load_module",
      lua.create_function(move |lua, name: String| {
        let path = {
          let mut p = project.borrow_mut();
          let file = if name.ends_with(".lua") {
            name.clone()
          } else {
            format!("{}.lua", name)
          };
          let path = resolve_in(&p, &file);
          if !p.mark_module_loaded(&path) {
            return Ok(());
          }
          p.register_input(&path);
          path
        };
        loaders::load_file(lua, &path)
      })?,
    )?;
  }

  {
    let project = project.clone();
    mk.set(
      "load_variables",
      lua.create_function(move |_, file: String| {
        let mut p = project.borrow_mut();
        let path = resolve_in(&p, &file);
        p.register_input(&path);
        let content = std::fs::read_to_string(&path)
          .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path, e)))?;
        for line in content.lines() {
          let line = line.trim();
          if line.is_empty() || line.starts_with('#') {
            continue;
          }
          if let Some((name, value)) = line.split_once('=') {
            p.vars.set(name.trim(), value.trim());
          }
        }
        Ok(())
      })?,
    )?;
  }

  // ---- path helpers ----

  mk.set(
    "normalize_filename",
    lua.create_function(|_, parts: Variadic<String>| {
      let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
      Ok(normalize_filename(&refs))
    })?,
  )?;

  mk.set(
    "split_filename",
    lua.create_function(|_, path: String| Ok(split_filename(&path)))?,
  )?;

  {
    let project = project.clone();
    mk.set(
      "make_temp_filename",
      lua.create_function(move |_, ext: Option<String>| {
        Ok(project.borrow_mut().make_temp_filename(&ext.unwrap_or_default()))
      })?,
    )?;
  }

  mk.set(
    "to_list",
    lua.create_function(|lua, value: LuaValue| {
      let items = value_to_list(&value)?;
      list_to_table(lua, &items)
    })?,
  )?;

  lua.globals().set("mk", mk)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn create_test_lua() -> (Lua, Rc<RefCell<Project>>) {
    let mut project = Project::new();
    project.vars.set("IN", ".");
    project.vars.set("OUT", "out");
    project.vars.set("TMP", "out");
    let project = Rc::new(RefCell::new(project));
    let lua = crate::lua::runtime::create_runtime(project.clone()).unwrap();
    (lua, project)
  }

  #[test]
  fn mk_global_exists() {
    let (lua, _) = create_test_lua();
    let mk: LuaTable = lua.globals().get("mk").unwrap();
    for name in [
      "generate",
      "generate_unique",
      "generate_copy",
      "generate_anonymous",
      "generate_directory",
      "rule_add_link",
      "rule_flatten_aliases",
      "rule_get_link_inputs",
      "rule_get_inputs",
      "add_variable",
      "set_variable",
      "get_variable",
      "get_variable_merge",
      "add_to_variable",
      "add_directory_variable",
      "load_file",
      "load_directory",
      "load_module",
      "load_variables",
      "normalize_filename",
      "split_filename",
      "make_temp_filename",
      "to_list",
      "var",
    ] {
      assert!(mk.contains_key(name).unwrap(), "missing mk.{name}");
    }
  }

  #[test]
  fn generate_accepts_strings_and_tables() {
    let (lua, project) = create_test_lua();
    lua
      .load(
        r#"
          mk.set_variable("CC", "cc")
          local first = mk.generate({"out/a.o"}, "src/a.c", "$(CC) -c $< -o $@")
          assert(first == "out/a.o", first)
          mk.generate("all", "out/a.o")
        "#,
      )
      .exec()
      .unwrap();
    let p = project.borrow();
    let rule = p.rules.rule(p.rules.require("out/a.o").unwrap());
    assert_eq!(rule.commands, ["cc -c src/a.c -o out/a.o"]);
    assert!(p.rules.lookup("all").is_some());
  }

  #[test]
  fn variables_round_trip_through_lua() {
    let (lua, project) = create_test_lua();
    lua
      .load(
        r#"
          mk.set_variable("CC", "gcc")
          assert(mk.get_variable("CC") == "gcc")
          assert(mk.add_variable("CC", "clang") == "gcc")
          mk.add_to_variable("CFLAGS", "-O2", "-g")
          assert(mk.get_variable("CFLAGS") == "-O2 -g")
          assert(mk.get_variable("CC", { CC = "tcc" }) == "tcc")
          assert(mk.get_variable_merge("CC", { CC = "tcc" }) == "gcc tcc")
          assert(mk.var.CC == "gcc")
          mk.var.LD = "ld.gold"
          assert(mk.get_variable("MISSING") == "")
        "#,
      )
      .exec()
      .unwrap();
    assert_eq!(project.borrow().vars.get("LD"), "ld.gold");
  }

  #[test]
  fn path_helpers_are_exposed() {
    let (lua, _) = create_test_lua();
    lua
      .load(
        r#"
          assert(mk.normalize_filename("a/./b/../c") == "a/c")
          assert(mk.normalize_filename("/a", "b") == "/a/b")
          local dir, stem, ext = mk.split_filename("dir/foo.bar.baz")
          assert(dir == "dir/" and stem == "foo.bar" and ext == ".baz")
          local list = mk.to_list("a b  c")
          assert(#list == 3 and list[2] == "b")
        "#,
      )
      .exec()
      .unwrap();
  }

  #[test]
  fn link_aliases_work_from_lua() {
    let (lua, _) = create_test_lua();
    lua
      .load(
        r#"
          mk.generate("libfoo", "libfoo.a")
          mk.rule_phony("libfoo")
          mk.rule_add_link("libfoo", "libfoo.a -lpthread")
          local items = mk.rule_get_link_inputs({"main.o", "libfoo"})
          assert(table.concat(items, " ") == "main.o libfoo.a -lpthread", table.concat(items, " "))
          mk.generate("prog", {"main.o", "libfoo"}, "cc -o $@ main.o")
          local inputs = mk.rule_get_inputs("prog")
          assert(table.concat(inputs, " ") == "main.o libfoo.a -lpthread")
        "#,
      )
      .exec()
      .unwrap();
  }

  #[test]
  fn rule_errors_reach_the_script() {
    let (lua, _) = create_test_lua();
    let result = lua
      .load(
        r#"
          mk.generate("a", nil, "cmd a")
          mk.generate("b", nil, "cmd b")
          mk.generate({"a", "b"}, nil, "cmd ab")
        "#,
      )
      .exec();
    let err = result.unwrap_err().to_string();
    assert!(err.contains("cannot merge"), "{err}");
  }

  #[test]
  fn unique_fallback_from_lua() {
    let (lua, _) = create_test_lua();
    lua
      .load(
        r#"
          assert(mk.generate_unique("t.o", "t.c", "cc -O2"))
          assert(not mk.generate_unique("t.o", "t.c", "cc -O0"))
          assert(mk.generate_unique("t0.o", "t.c", "cc -O0"))
        "#,
      )
      .exec()
      .unwrap();
  }

  #[test]
  fn temp_filenames_are_distinct() {
    let (lua, _) = create_test_lua();
    lua
      .load(
        r#"
          local a = mk.make_temp_filename(".c")
          local b = mk.make_temp_filename(".c")
          assert(a ~= b)
          assert(a:find("out/.tmp/", 1, true) == 1, a)
        "#,
      )
      .exec()
      .unwrap();
  }

  mod loading {
    use super::*;
    use std::fs;

    #[test]
    fn load_file_registers_the_input() {
      let dir = tempfile::tempdir().unwrap();
      fs::write(dir.path().join("extra.lua"), r#"mk.set_variable("FROM_EXTRA", "1")"#).unwrap();

      let (lua, project) = create_test_lua();
      project
        .borrow_mut()
        .vars
        .set("IN", dir.path().to_str().unwrap());
      lua.load(r#"mk.load_file("extra.lua")"#).exec().unwrap();

      let p = project.borrow();
      assert_eq!(p.vars.get("FROM_EXTRA"), "1");
      assert_eq!(p.input_files().len(), 1);
      assert!(p.input_files()[0].ends_with("extra.lua"));
    }

    #[test]
    fn load_module_loads_once() {
      let dir = tempfile::tempdir().unwrap();
      fs::write(
        dir.path().join("common.lua"),
        r#"mk.add_to_variable("LOADS", "x")"#,
      )
      .unwrap();

      let (lua, project) = create_test_lua();
      project
        .borrow_mut()
        .vars
        .set("IN", dir.path().to_str().unwrap());
      lua
        .load(
          r#"
            mk.load_module("common")
            mk.load_module("common")
          "#,
        )
        .exec()
        .unwrap();
      assert_eq!(project.borrow().vars.get("LOADS"), "x");
    }

    #[test]
    fn load_directory_rebases_directory_variables() {
      let dir = tempfile::tempdir().unwrap();
      fs::create_dir(dir.path().join("sub")).unwrap();
      fs::write(
        dir.path().join("sub").join("Rules.lua"),
        r#"
          mk.set_variable("SEEN_OUT", mk.var.OUT)
          mk.generate(mk.var.OUT .. "/sub.o", nil, "cc")
        "#,
      )
      .unwrap();

      let (lua, project) = create_test_lua();
      {
        let mut p = project.borrow_mut();
        let in_dir = dir.path().to_str().unwrap().to_string();
        p.vars.set("IN", &in_dir);
        p.vars.set("OUT", "out");
      }
      lua.load(r#"mk.load_directory("sub")"#).exec().unwrap();

      let p = project.borrow();
      assert_eq!(p.vars.get("SEEN_OUT"), "out/sub");
      assert_eq!(p.vars.get("OUT"), "out");
      assert!(p.rules.lookup("out/sub/sub.o").is_some());
      assert!(p.input_files()[0].ends_with("sub/Rules.lua"));
    }

    #[test]
    fn load_directory_rejects_escapes() {
      let (lua, _) = create_test_lua();
      assert!(lua.load(r#"mk.load_directory("/abs")"#).exec().is_err());
      assert!(lua.load(r#"mk.load_directory("../up")"#).exec().is_err());
    }

    #[test]
    fn load_variables_reads_assignments() {
      let dir = tempfile::tempdir().unwrap();
      fs::write(
        dir.path().join("config.vars"),
        "# build configuration\nCC = gcc\nCFLAGS=-O2 -g\n\n",
      )
      .unwrap();

      let (lua, project) = create_test_lua();
      project
        .borrow_mut()
        .vars
        .set("IN", dir.path().to_str().unwrap());
      lua.load(r#"mk.load_variables("config.vars")"#).exec().unwrap();

      let p = project.borrow();
      assert_eq!(p.vars.get("CC"), "gcc");
      assert_eq!(p.vars.get("CFLAGS"), "-O2 -g");
    }
  }
}
