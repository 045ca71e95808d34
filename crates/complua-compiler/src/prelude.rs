//! The serialiser prelude: plain-dialect source injected into every
//! compile-time program and prepended to every output file.

/// Reserved global name of the serialiser.
pub const REPR_FN: &str = "__complua_repr";

/// Serialises a runtime value to source text that rebuilds it: strings as
/// quoted literals, tables as `setmetatable({...}, {})` with recursively
/// serialised keys, functions as reloaded byte-dumps, everything else via
/// `tostring`. Round-trips its own output up to metatable identity.
pub const PRELUDE: &str = r#"function __complua_repr(value)
  local t = type(value)
  if t == "string" then
    return string.format("%q", value)
  elseif t == "table" then
    local parts = {}
    for k, v in pairs(value) do
      parts[#parts + 1] = "[" .. __complua_repr(k) .. "]=" .. __complua_repr(v)
    end
    return "setmetatable({" .. table.concat(parts, ",") .. "}, {})"
  elseif t == "function" then
    local dump = string.dump(value)
    local bytes = {}
    for i = 1, #dump do
      bytes[i] = string.byte(dump, i)
    end
    return "loadstring(string.char(" .. table.concat(bytes, ",") .. "))"
  else
    return tostring(value)
  end
end"#;
