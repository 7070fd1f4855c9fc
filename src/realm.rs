//! Realm: the intrinsic constructors and prototypes, and the object factories
//!
//! Every object the library builds comes from a realm. Two realms have
//! distinct `Object`, `Array`, ... constructors, so values moved between them
//! behave like values crossing execution contexts in a browser.
//!
//! Constructors and prototypes reference each other through `constructor` and
//! `prototype`, so a realm severs those links when it is dropped. Values that
//! outlive their realm keep their own properties but lose inherited members.

use crate::error::UnderbarError;
use crate::prelude::*;
use crate::string_dict::StringDict;
use crate::value::{
    CheapClone, ExoticObject, JsFunction, JsObject, JsObjectRef, JsString, JsValue,
    MAX_ARRAY_LENGTH, NativeFn, NativeFunction, Property, PropertyKey, date_to_iso_string,
    make_date_value, parse_date_string, time_clip,
};

/// Prototypes needed to box primitives, captured by the constructors that box
#[derive(Clone)]
struct Boxing {
    object: JsObjectRef,
    string: JsObjectRef,
    number: JsObjectRef,
    boolean: JsObjectRef,
}

impl Boxing {
    /// ToObject
    fn to_object(&self, value: &JsValue) -> Result<JsObjectRef, UnderbarError> {
        let (exotic, proto) = match value {
            JsValue::Object(obj) => return Ok(obj.cheap_clone()),
            JsValue::Undefined | JsValue::Null => {
                return Err(UnderbarError::type_error(format!(
                    "Cannot convert {:?} to object",
                    value
                )));
            }
            JsValue::Boolean(b) => (ExoticObject::Boolean(*b), &self.boolean),
            JsValue::Number(n) => (ExoticObject::Number(*n), &self.number),
            JsValue::String(s) => (ExoticObject::StringObj(s.cheap_clone()), &self.string),
        };
        Ok(JsObjectRef::new(JsObject::with_exotic(
            exotic,
            Some(proto.cheap_clone()),
        )))
    }
}

/// An execution context: intrinsic objects plus the factories built on them
pub struct Realm {
    string_dict: RefCell<StringDict>,
    boxing: Boxing,
    /// User constructors built by [`Realm::new_constructor`], torn down with the realm
    constructors: RefCell<Vec<JsObjectRef>>,

    // Prototypes
    pub object_prototype: JsObjectRef,
    pub function_prototype: JsObjectRef,
    pub array_prototype: JsObjectRef,
    pub string_prototype: JsObjectRef,
    pub number_prototype: JsObjectRef,
    pub boolean_prototype: JsObjectRef,
    pub date_prototype: JsObjectRef,
    pub regexp_prototype: JsObjectRef,
    pub error_prototype: JsObjectRef,

    // Constructors
    pub object_constructor: JsObjectRef,
    pub function_constructor: JsObjectRef,
    pub array_constructor: JsObjectRef,
    pub string_constructor: JsObjectRef,
    pub number_constructor: JsObjectRef,
    pub boolean_constructor: JsObjectRef,
    pub date_constructor: JsObjectRef,
    pub regexp_constructor: JsObjectRef,
    pub error_constructor: JsObjectRef,
}

impl Realm {
    /// Create a realm with freshly wired intrinsics
    pub fn new() -> Self {
        let mut dict = StringDict::with_common_strings();

        let object_prototype = JsObjectRef::new(JsObject::new());
        let proto = |exotic: ExoticObject| {
            JsObjectRef::new(JsObject::with_exotic(
                exotic,
                Some(object_prototype.cheap_clone()),
            ))
        };

        // Function.prototype is itself callable and returns undefined
        let function_prototype = proto(ExoticObject::Function(JsFunction::Native(
            NativeFunction {
                name: dict.get_or_insert(""),
                func: native(|_, _| Ok(JsValue::Undefined)),
                arity: 0,
            },
        )));
        // The primitive prototypes are themselves instances of their kind
        let array_prototype = proto(ExoticObject::Array {
            elements: Vec::new(),
        });
        let string_prototype = proto(ExoticObject::StringObj(dict.get_or_insert("")));
        let number_prototype = proto(ExoticObject::Number(0.0));
        let boolean_prototype = proto(ExoticObject::Boolean(false));
        let date_prototype = proto(ExoticObject::Ordinary);
        let regexp_prototype = proto(ExoticObject::Ordinary);
        let error_prototype = proto(ExoticObject::Ordinary);

        let boxing = Boxing {
            object: object_prototype.cheap_clone(),
            string: string_prototype.cheap_clone(),
            number: number_prototype.cheap_clone(),
            boolean: boolean_prototype.cheap_clone(),
        };

        {
            let name = dict.key("name");
            let message = dict.key("message");
            let mut error = error_prototype.borrow_mut();
            error.define_property(name, Property::hidden(JsValue::from("Error")));
            error.define_property(message, Property::hidden(JsValue::from("")));
        }

        let mut intrinsic = |name: &str, arity: usize, prototype: &JsObjectRef, func: NativeFn| {
            let ctor = native_function(&mut dict, &function_prototype, name, arity, func);
            link_constructor(&mut dict, &ctor, prototype, false);
            ctor
        };

        let object_constructor = intrinsic("Object", 1, &object_prototype, {
            let boxing = boxing.clone();
            native(move |this, args| {
                match args.first() {
                    None | Some(JsValue::Undefined) | Some(JsValue::Null) => {
                        // `new Object()` keeps the instance it was handed
                        if fresh_instance(this, &boxing.object).is_some() {
                            return Ok(this.cheap_clone());
                        }
                        Ok(JsValue::Object(JsObjectRef::new(JsObject::with_prototype(
                            boxing.object.cheap_clone(),
                        ))))
                    }
                    Some(value) => Ok(JsValue::Object(boxing.to_object(value)?)),
                }
            })
        });

        let function_constructor = intrinsic("Function", 1, &function_prototype, {
            native(|_, _| {
                Err(UnderbarError::type_error(
                    "Function constructor cannot compile source text",
                ))
            })
        });

        let array_constructor = intrinsic("Array", 1, &array_prototype, {
            let array_prototype = array_prototype.cheap_clone();
            native(move |this, args| {
                let elements = match args {
                    [JsValue::Number(n)] => {
                        let len = *n;
                        if len < 0.0 || math::trunc(len) != len || len > f64::from(u32::MAX) {
                            return Err(UnderbarError::range_error("Invalid array length"));
                        }
                        if len > f64::from(MAX_ARRAY_LENGTH) {
                            return Err(UnderbarError::range_error(format!(
                                "Array length {} exceeds the maximum array length",
                                len
                            )));
                        }
                        vec![JsValue::Undefined; len as usize]
                    }
                    _ => args.to_vec(),
                };
                if let Some(instance) = fresh_instance(this, &array_prototype) {
                    instance.borrow_mut().exotic = ExoticObject::Array { elements };
                    return Ok(this.cheap_clone());
                }
                Ok(JsValue::Object(JsObjectRef::new(JsObject::with_exotic(
                    ExoticObject::Array { elements },
                    Some(array_prototype.cheap_clone()),
                ))))
            })
        });

        let string_constructor = intrinsic("String", 1, &string_prototype, {
            let string_prototype = string_prototype.cheap_clone();
            native(move |this, args| {
                let s = args
                    .first()
                    .map(|v| v.to_js_string())
                    .unwrap_or_else(|| JsString::from(""));
                match fresh_instance(this, &string_prototype) {
                    Some(instance) => {
                        instance.borrow_mut().exotic = ExoticObject::StringObj(s);
                        Ok(this.cheap_clone())
                    }
                    None => Ok(JsValue::String(s)),
                }
            })
        });

        let number_constructor = intrinsic("Number", 1, &number_prototype, {
            let number_prototype = number_prototype.cheap_clone();
            native(move |this, args| {
                let n = args.first().map(|v| v.to_number()).unwrap_or(0.0);
                match fresh_instance(this, &number_prototype) {
                    Some(instance) => {
                        instance.borrow_mut().exotic = ExoticObject::Number(n);
                        Ok(this.cheap_clone())
                    }
                    None => Ok(JsValue::Number(n)),
                }
            })
        });

        let boolean_constructor = intrinsic("Boolean", 1, &boolean_prototype, {
            let boolean_prototype = boolean_prototype.cheap_clone();
            native(move |this, args| {
                let b = args.first().map(|v| v.to_boolean()).unwrap_or(false);
                match fresh_instance(this, &boolean_prototype) {
                    Some(instance) => {
                        instance.borrow_mut().exotic = ExoticObject::Boolean(b);
                        Ok(this.cheap_clone())
                    }
                    None => Ok(JsValue::Boolean(b)),
                }
            })
        });

        let date_constructor = intrinsic("Date", 7, &date_prototype, {
            let date_prototype = date_prototype.cheap_clone();
            native(move |this, args| {
                match fresh_instance(this, &date_prototype) {
                    Some(instance) => {
                        instance.borrow_mut().exotic = ExoticObject::Date {
                            timestamp: date_from_args(args),
                        };
                        Ok(this.cheap_clone())
                    }
                    // Called as a function, Date ignores its arguments
                    None => Ok(JsValue::from(
                        date_to_iso_string(time_clip(current_time_ms()))
                            .unwrap_or_else(|| String::from("Invalid Date")),
                    )),
                }
            })
        });

        let regexp_constructor = intrinsic("RegExp", 2, &regexp_prototype, {
            let regexp_prototype = regexp_prototype.cheap_clone();
            native(move |this, args| {
                let (source, flags) = regexp_parts(args)?;
                let target = match fresh_instance(this, &regexp_prototype) {
                    Some(instance) => instance,
                    None => JsObjectRef::new(JsObject::with_prototype(
                        regexp_prototype.cheap_clone(),
                    )),
                };
                init_regexp(&target, source, flags)?;
                Ok(JsValue::Object(target))
            })
        });

        let error_constructor = intrinsic("Error", 1, &error_prototype, {
            let error_prototype = error_prototype.cheap_clone();
            native(move |this, args| {
                let target = match fresh_instance(this, &error_prototype) {
                    Some(instance) => instance,
                    None => JsObjectRef::new(JsObject::with_prototype(
                        error_prototype.cheap_clone(),
                    )),
                };
                let message = match args.first() {
                    None | Some(JsValue::Undefined) => None,
                    Some(value) => Some(value.to_js_string()),
                };
                init_error(&target, message);
                Ok(JsValue::Object(target))
            })
        });

        Self {
            string_dict: RefCell::new(dict),
            boxing,
            constructors: RefCell::new(Vec::new()),
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            date_prototype,
            regexp_prototype,
            error_prototype,
            object_constructor,
            function_constructor,
            array_constructor,
            string_constructor,
            number_constructor,
            boolean_constructor,
            date_constructor,
            regexp_constructor,
            error_constructor,
        }
    }

    /// Intern a string in this realm's dictionary
    pub fn intern(&self, s: &str) -> JsString {
        self.string_dict.borrow_mut().get_or_insert(s)
    }

    /// Create a property key from a string, interning names that are not indices
    pub fn key(&self, s: &str) -> PropertyKey {
        self.string_dict.borrow_mut().key(s)
    }

    /// Create a plain object (`{}`)
    pub fn new_object(&self) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_prototype(self.object_prototype.cheap_clone()))
    }

    /// `Object.create(proto)`; `None` creates an object with a null prototype
    pub fn object_create(&self, prototype: Option<&JsObjectRef>) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::Ordinary,
            prototype.cloned(),
        ))
    }

    /// Create a plain object from `(name, value)` pairs, in order
    pub fn object_from<K: AsRef<str>>(
        &self,
        entries: impl IntoIterator<Item = (K, JsValue)>,
    ) -> JsObjectRef {
        let obj = self.new_object();
        {
            let mut o = obj.borrow_mut();
            for (name, value) in entries {
                o.set_property(self.key(name.as_ref()), value);
            }
        }
        obj
    }

    pub fn new_array(&self, elements: Vec<JsValue>) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::Array { elements },
            Some(self.array_prototype.cheap_clone()),
        ))
    }

    /// Create the arguments object of a call with the given argument values
    pub fn new_arguments(&self, elements: Vec<JsValue>) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::Arguments { elements },
            Some(self.object_prototype.cheap_clone()),
        ))
    }

    /// Create a date from a time value in milliseconds since the epoch
    pub fn new_date(&self, timestamp: f64) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::Date {
                timestamp: time_clip(timestamp),
            },
            Some(self.date_prototype.cheap_clone()),
        ))
    }

    /// Create a date from an ISO-8601 string; unparseable input gives an invalid date
    pub fn parse_date(&self, text: &str) -> JsObjectRef {
        self.new_date(parse_date_string(text))
    }

    /// Create a pattern object (`/source/flags`)
    pub fn new_regexp(&self, source: &str, flags: &str) -> Result<JsObjectRef, UnderbarError> {
        let obj = JsObjectRef::new(JsObject::with_prototype(self.regexp_prototype.cheap_clone()));
        init_regexp(&obj, self.intern(source), self.intern(flags))?;
        Ok(obj)
    }

    /// Create an error object; its `message` is an own non-enumerable property
    pub fn new_error(&self, message: &str) -> JsObjectRef {
        let obj = JsObjectRef::new(JsObject::with_prototype(self.error_prototype.cheap_clone()));
        init_error(&obj, Some(JsString::from(message)));
        obj
    }

    /// Create a callable without a `prototype` (an arrow function or method)
    pub fn new_function<F>(&self, name: &str, arity: usize, func: F) -> JsObjectRef
    where
        F: Fn(&JsValue, &[JsValue]) -> Result<JsValue, UnderbarError> + 'static,
    {
        let mut dict = self.string_dict.borrow_mut();
        native_function(&mut dict, &self.function_prototype, name, arity, Rc::new(func))
    }

    /// Create a constructor with its own `prototype` object, like a class declaration
    pub fn new_constructor<F>(&self, name: &str, arity: usize, func: F) -> JsObjectRef
    where
        F: Fn(&JsValue, &[JsValue]) -> Result<JsValue, UnderbarError> + 'static,
    {
        let prototype = self.new_object();
        let ctor = {
            let mut dict = self.string_dict.borrow_mut();
            let ctor =
                native_function(&mut dict, &self.function_prototype, name, arity, Rc::new(func));
            link_constructor(&mut dict, &ctor, &prototype, true);
            ctor
        };
        self.constructors.borrow_mut().push(ctor.cheap_clone());
        ctor
    }

    /// The `new` operator
    ///
    /// Builds an instance inheriting from `ctor.prototype`, runs the
    /// constructor on it and returns the object the constructor produced, if
    /// any, otherwise the instance.
    pub fn construct(&self, ctor: &JsValue, args: &[JsValue]) -> Result<JsValue, UnderbarError> {
        let prototype = match ctor.get("prototype") {
            JsValue::Object(proto) if ctor.is_callable() => proto,
            _ => {
                return Err(UnderbarError::type_error(format!(
                    "{:?} is not a constructor",
                    ctor
                )));
            }
        };
        let this = JsValue::Object(JsObjectRef::new(JsObject::with_prototype(prototype)));
        match ctor.call(&this, args)? {
            result @ JsValue::Object(_) => Ok(result),
            _ => Ok(this),
        }
    }

    pub fn new_string_object(&self, s: &str) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::StringObj(JsString::from(s)),
            Some(self.string_prototype.cheap_clone()),
        ))
    }

    pub fn new_number_object(&self, n: f64) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::Number(n),
            Some(self.number_prototype.cheap_clone()),
        ))
    }

    pub fn new_boolean_object(&self, b: bool) -> JsObjectRef {
        JsObjectRef::new(JsObject::with_exotic(
            ExoticObject::Boolean(b),
            Some(self.boolean_prototype.cheap_clone()),
        ))
    }

    /// ToObject: objects pass through, primitives are boxed, null and undefined fail
    pub fn to_object(&self, value: &JsValue) -> Result<JsObjectRef, UnderbarError> {
        self.boxing.to_object(value)
    }

    fn intrinsics(&self) -> [&JsObjectRef; 18] {
        [
            &self.object_constructor,
            &self.function_constructor,
            &self.array_constructor,
            &self.string_constructor,
            &self.number_constructor,
            &self.boolean_constructor,
            &self.date_constructor,
            &self.regexp_constructor,
            &self.error_constructor,
            &self.object_prototype,
            &self.function_prototype,
            &self.array_prototype,
            &self.string_prototype,
            &self.number_prototype,
            &self.boolean_prototype,
            &self.date_prototype,
            &self.regexp_prototype,
            &self.error_prototype,
        ]
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Realm {
    fn drop(&mut self) {
        let constructors = mem::take(self.constructors.get_mut());
        tracing::debug!(
            user_constructors = constructors.len(),
            "tearing down realm intrinsics"
        );
        for ctor in &constructors {
            let prototype = ctor.get(&PropertyKey::from("prototype"));
            ctor.borrow_mut().clear();
            if let JsValue::Object(proto) = prototype {
                proto.borrow_mut().clear();
            }
        }
        for obj in self.intrinsics() {
            obj.borrow_mut().clear();
        }
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("interned_strings", &self.string_dict.borrow().len())
            .field("user_constructors", &self.constructors.borrow().len())
            .finish()
    }
}

/// Fix a closure's signature as a native function
fn native<F>(func: F) -> NativeFn
where
    F: Fn(&JsValue, &[JsValue]) -> Result<JsValue, UnderbarError> + 'static,
{
    Rc::new(func)
}

/// Create a function object with hidden `name` and `length`
fn native_function(
    dict: &mut StringDict,
    function_prototype: &JsObjectRef,
    name: &str,
    arity: usize,
    func: NativeFn,
) -> JsObjectRef {
    let name = dict.get_or_insert(name);
    let obj = JsObjectRef::new(JsObject::with_exotic(
        ExoticObject::Function(JsFunction::Native(NativeFunction {
            name: name.cheap_clone(),
            func,
            arity,
        })),
        Some(function_prototype.cheap_clone()),
    ));
    {
        let mut o = obj.borrow_mut();
        o.define_property(
            dict.key("name"),
            Property::with_attributes(JsValue::String(name), false, false, true),
        );
        o.define_property(
            dict.key("length"),
            Property::with_attributes(JsValue::from(arity), false, false, true),
        );
    }
    obj
}

/// Wire `ctor.prototype` and `prototype.constructor`
fn link_constructor(
    dict: &mut StringDict,
    ctor: &JsObjectRef,
    prototype: &JsObjectRef,
    writable: bool,
) {
    ctor.borrow_mut().define_property(
        dict.key("prototype"),
        Property::with_attributes(JsValue::Object(prototype.cheap_clone()), writable, false, false),
    );
    prototype.borrow_mut().define_property(
        dict.key("constructor"),
        Property::hidden(JsValue::Object(ctor.cheap_clone())),
    );
}

/// The instance `construct` created for a constructor with this prototype, if `this` is one
fn fresh_instance(this: &JsValue, prototype: &JsObjectRef) -> Option<JsObjectRef> {
    let JsValue::Object(obj) = this else {
        return None;
    };
    let is_fresh = {
        let o = obj.borrow();
        matches!(o.exotic, ExoticObject::Ordinary)
            && o.prototype().is_some_and(|p| JsObjectRef::ptr_eq(p, prototype))
            && o.properties().next().is_none()
    };
    is_fresh.then(|| obj.cheap_clone())
}

fn regexp_parts(args: &[JsValue]) -> Result<(JsString, JsString), UnderbarError> {
    let flags = match args.get(1) {
        None | Some(JsValue::Undefined) => None,
        Some(value) => Some(value.to_js_string()),
    };
    match args.first() {
        // RegExp(pattern) copies source, and flags unless new ones are given
        Some(JsValue::Object(obj)) => {
            if let ExoticObject::RegExp { source, flags: own } = &obj.borrow().exotic {
                return Ok((source.cheap_clone(), flags.unwrap_or_else(|| own.cheap_clone())));
            }
            Ok((
                JsValue::Object(obj.cheap_clone()).to_js_string(),
                flags.unwrap_or_else(|| JsString::from("")),
            ))
        }
        None | Some(JsValue::Undefined) => Ok((
            JsString::from("(?:)"),
            flags.unwrap_or_else(|| JsString::from("")),
        )),
        Some(value) => Ok((
            value.to_js_string(),
            flags.unwrap_or_else(|| JsString::from("")),
        )),
    }
}

fn init_regexp(obj: &JsObjectRef, source: JsString, flags: JsString) -> Result<(), UnderbarError> {
    crate::regexp::validate_flags(flags.as_str())?;
    #[cfg(feature = "regex")]
    crate::regexp::compile(source.as_str(), flags.as_str()).map(drop)?;

    let source = if source.is_empty() {
        JsString::from("(?:)")
    } else {
        source
    };
    let mut o = obj.borrow_mut();
    o.exotic = ExoticObject::RegExp { source, flags };
    o.define_property(
        PropertyKey::from("lastIndex"),
        Property::with_attributes(JsValue::Number(0.0), true, false, false),
    );
    Ok(())
}

fn init_error(obj: &JsObjectRef, message: Option<JsString>) {
    let mut o = obj.borrow_mut();
    o.exotic = ExoticObject::Error;
    if let Some(message) = message {
        o.define_property(
            PropertyKey::from("message"),
            Property::hidden(JsValue::String(message)),
        );
    }
}

fn date_from_args(args: &[JsValue]) -> f64 {
    let number = |i: usize, default: f64| args.get(i).map_or(default, JsValue::to_number);
    match args {
        [] => time_clip(current_time_ms()),
        [JsValue::String(s)] => parse_date_string(s.as_str()),
        [value] => time_clip(value.to_number()),
        _ => make_date_value(
            number(0, f64::NAN),
            number(1, 0.0),
            number(2, 1.0),
            number(3, 0.0),
            number(4, 0.0),
            number(5, 0.0),
            number(6, 0.0),
        ),
    }
}

#[cfg(feature = "std")]
fn current_time_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(f64::NAN, |elapsed| elapsed.as_millis() as f64)
}

/// Without a clock, the current time is an invalid date
#[cfg(not(feature = "std"))]
fn current_time_ms() -> f64 {
    f64::NAN
}
