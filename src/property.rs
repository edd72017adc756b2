//! The typed property store backing every host object a plugin can
//! address.
//!
//! Each cell is boxed so that addresses handed across the ABI stay
//! valid while the owning set is alive: `propGetString` returns a
//! pointer straight into a stored `CString` buffer, and `address`
//! returns a pointer to the cell itself. Writes go through the box,
//! so a set replaces the contents without moving the cell.

use crate::schema::{self, Allowed, PropType};
use crate::types::{OfxRectD, OfxRectI, OfxStatus, ofxstatus};
use libc::{c_int, c_void};
use std::collections::HashMap;
use std::error::Error;
use std::ffi::CString;

/// An opaque machine word. Used for pointer properties, which the
/// host never dereferences but only passes back to the plugin.
#[derive(Clone, Debug, PartialEq)]
pub struct Addr(pub *const c_void);
unsafe impl Send for Addr {}

#[derive(Clone, PartialEq)]
pub enum PropertyValue {
    Pointer(Addr),
    String(CString),
    Double(f64),
    Int(c_int),
}

impl PropertyValue {
    pub fn prop_type(&self) -> PropType {
        match self {
            PropertyValue::Pointer(_) => PropType::Pointer,
            PropertyValue::String(_) => PropType::String,
            PropertyValue::Double(_) => PropType::Double,
            PropertyValue::Int(_) => PropType::Int,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => s.to_str().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Pointer(Addr(a)) => write!(f, "{:?}", a),
            PropertyValue::String(s) => write!(f, "{:?}", s),
            PropertyValue::Double(d) => write!(f, "{:?}", d),
            PropertyValue::Int(i) => write!(f, "{:?}", i),
        }
    }
}

// Basic conversions
impl From<CString> for PropertyValue {
    fn from(s: CString) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(CString::new(s).unwrap())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(CString::new(s).unwrap())
    }
}

impl From<c_int> for PropertyValue {
    fn from(i: c_int) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<usize> for PropertyValue {
    fn from(i: usize) -> Self {
        PropertyValue::Int(i as c_int)
    }
}

// OFX uses integers with 0/1 value for boolean properties
impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Int(if b { 1 } else { 0 })
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Double(d)
    }
}

impl From<*mut c_void> for PropertyValue {
    fn from(p: *mut c_void) -> Self {
        PropertyValue::Pointer(Addr(p))
    }
}

impl From<*const c_void> for PropertyValue {
    fn from(p: *const c_void) -> Self {
        PropertyValue::Pointer(Addr(p))
    }
}

/// All values of one property. Cells are boxed for address stability.
#[derive(Clone, Debug, Default)]
pub struct Property(pub Vec<Box<PropertyValue>>);

// Make a Property from a single value
impl<A: Into<PropertyValue>> From<A> for Property {
    fn from(a: A) -> Self {
        Property(vec![Box::new(a.into())])
    }
}

// Make a Property from an array of values
impl<T: Copy, const S: usize> From<[T; S]> for Property
where
    PropertyValue: From<T>,
{
    fn from(a: [T; S]) -> Self {
        Property(a.into_iter().map(|v| Box::new(v.into())).collect())
    }
}

impl<T> From<Vec<T>> for Property
where
    PropertyValue: From<T>,
{
    fn from(vec: Vec<T>) -> Self {
        Property(vec.into_iter().map(|v| Box::new(v.into())).collect())
    }
}

impl From<&OfxRectI> for Property {
    fn from(r: &OfxRectI) -> Self {
        [r.x1, r.y1, r.x2, r.y2].into()
    }
}

impl From<&OfxRectD> for Property {
    fn from(r: &OfxRectD) -> Self {
        [r.x1, r.y1, r.x2, r.y2].into()
    }
}

/// A property-store failure carrying the OFX status it maps to.
#[derive(Debug)]
pub struct PropError {
    pub status: OfxStatus,
    pub message: String,
}

impl PropError {
    fn new(status: OfxStatus, message: String) -> Self {
        Self { status, message }
    }
}

impl std::fmt::Display for PropError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for PropError {}

pub type PropResult<T> = Result<T, PropError>;

#[derive(Clone, Debug, Default)]
pub struct PropertySet {
    pub name: String,
    values: HashMap<String, Property>,
}

impl PropertySet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Introduce a property, validating it against the schema.
    pub fn add(&mut self, key: &str, value: Property, replace: bool) -> PropResult<()> {
        if self.contains(key) && !replace {
            return Err(PropError::new(
                ofxstatus::ErrExists,
                format!("{} already in {}", key, self.name),
            ));
        }
        let def = schema::lookup(key).ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrUnknown,
                format!("{} is not a supported OFX property", key),
            )
        })?;
        self.validate(key, def, &value)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Introduce a property with its schema default value.
    pub fn add_default(&mut self, key: &str) -> PropResult<()> {
        let def = schema::lookup(key).ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrUnknown,
                format!("{} is not a supported OFX property", key),
            )
        })?;
        let value = def.default_property().ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrValue,
                format!("{} requires a value to be supplied", key),
            )
        })?;
        self.add(key, value, false)
    }

    fn validate(&self, key: &str, def: &schema::PropertyDef, value: &Property) -> PropResult<()> {
        if def.dims != 0 && value.0.len() != def.dims {
            return Err(PropError::new(
                ofxstatus::ErrValue,
                format!(
                    "{} expects {} value(s), got {} in {}",
                    key,
                    def.dims,
                    value.0.len(),
                    self.name
                ),
            ));
        }
        for cell in &value.0 {
            self.check_cell(key, def, cell)?;
        }
        Ok(())
    }

    fn check_cell(
        &self,
        key: &str,
        def: &schema::PropertyDef,
        value: &PropertyValue,
    ) -> PropResult<()> {
        if !def.types.contains(&value.prop_type()) {
            return Err(PropError::new(
                ofxstatus::ErrValue,
                format!(
                    "{:?} is not a valid type for {} in {}",
                    value.prop_type(),
                    key,
                    self.name
                ),
            ));
        }
        let allowed_err = || {
            PropError::new(
                ofxstatus::ErrValue,
                format!("{:?} is not a valid value for {} in {}", value, key, self.name),
            )
        };
        match (&def.allowed, value) {
            (Some(Allowed::Ints(set)), PropertyValue::Int(i)) if !set.contains(i) => {
                Err(allowed_err())
            }
            (Some(Allowed::Strs(set)), PropertyValue::String(s)) => {
                match s.to_str() {
                    Ok(s) if set.contains(&s) => Ok(()),
                    _ => Err(allowed_err()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Write one cell of an existing property.
    ///
    /// Writes go through the cell's box so its address is preserved.
    /// Appending is only allowed for variable-length properties, at
    /// `index == length`.
    pub fn update(&mut self, key: &str, index: usize, value: PropertyValue) -> PropResult<()> {
        let def = schema::lookup(key);
        if let Some(def) = def {
            self.check_cell(key, def, &value)?;
        }
        let name = self.name.clone();
        let prop = self.values.get_mut(key).ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrUnknown,
                format!("{} not in property set {}", key, name),
            )
        })?;
        if index < prop.0.len() {
            *prop.0[index] = value;
            Ok(())
        } else if index == prop.0.len() && def.is_none_or(|d| d.dims == 0) {
            prop.0.push(Box::new(value));
            Ok(())
        } else {
            Err(PropError::new(
                ofxstatus::ErrBadIndex,
                format!("{} bad index {} in {}", key, index, name),
            ))
        }
    }

    pub fn get(&self, key: &str, index: usize) -> PropResult<&PropertyValue> {
        let prop = self.values.get(key).ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrUnknown,
                format!("{} not in property set {}", key, self.name),
            )
        })?;
        prop.0.get(index).map(|b| b.as_ref()).ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrBadIndex,
                format!("{} bad index {} in {}", key, index, self.name),
            )
        })
    }

    pub fn length(&self, key: &str) -> PropResult<usize> {
        self.values.get(key).map(|p| p.0.len()).ok_or_else(|| {
            PropError::new(
                ofxstatus::ErrUnknown,
                format!("{} not in property set {}", key, self.name),
            )
        })
    }

    /// Raw address of a cell's storage. For strings this is the start
    /// of the NUL-terminated byte buffer.
    pub fn address(&self, key: &str, index: usize) -> PropResult<*const c_void> {
        Ok(match self.get(key, index)? {
            PropertyValue::String(s) => s.as_ptr() as *const c_void,
            PropertyValue::Int(i) => i as *const c_int as *const c_void,
            PropertyValue::Double(d) => d as *const f64 as *const c_void,
            PropertyValue::Pointer(a) => &a.0 as *const *const c_void as *const c_void,
        })
    }

    // Typed convenience accessors for host-side code.

    pub fn get_int(&self, key: &str, index: usize) -> Option<c_int> {
        match self.get(key, index).ok()? {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str, index: usize) -> Option<f64> {
        match self.get(key, index).ok()? {
            PropertyValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str, index: usize) -> Option<&str> {
        self.get(key, index).ok()?.as_str()
    }

    /// Template helper: schema violations while seeding a property
    /// set are host bugs, not plugin-visible failures.
    pub fn seed(&mut self, key: &str, value: impl Into<Property>) {
        if let Err(e) = self.add(key, value.into(), false) {
            debug_assert!(false, "seeding {}: {}", self.name, e);
            tracing::error!("seeding {}: {}", self.name, e);
        }
    }

    pub fn seed_default(&mut self, key: &str) {
        if let Err(e) = self.add_default(key) {
            debug_assert!(false, "seeding {}: {}", self.name, e);
            tracing::error!("seeding {}: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants;

    #[test]
    fn add_then_get() {
        let mut props = PropertySet::new("test");
        props
            .add(constants::OfxPropName, "flip".into(), false)
            .unwrap();
        assert_eq!(props.get_str(constants::OfxPropName, 0), Some("flip"));
        assert_eq!(props.length(constants::OfxPropName).unwrap(), 1);
    }

    #[test]
    fn duplicate_add_needs_replace() {
        let mut props = PropertySet::new("test");
        props
            .add(constants::OfxPropLabel, "one".into(), false)
            .unwrap();
        let err = props
            .add(constants::OfxPropLabel, "two".into(), false)
            .unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrExists);
        props
            .add(constants::OfxPropLabel, "two".into(), true)
            .unwrap();
        assert_eq!(props.get_str(constants::OfxPropLabel, 0), Some("two"));
    }

    #[test]
    fn unknown_name_rejected() {
        let mut props = PropertySet::new("test");
        let err = props.add("NotAnOfxProperty", 1.into(), false).unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrUnknown);
    }

    #[test]
    fn out_of_enum_rejected() {
        let mut props = PropertySet::new("test");
        let err = props
            .add(
                constants::OfxImageClipPropConnected,
                Property::from(7),
                false,
            )
            .unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrValue);
        let err = props
            .add(
                constants::OfxImageEffectPropPixelDepth,
                "NotADepth".into(),
                false,
            )
            .unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrValue);
    }

    #[test]
    fn wrong_arity_rejected() {
        let mut props = PropertySet::new("test");
        let err = props
            .add(
                constants::OfxImageEffectPropRenderScale,
                Property::from(1.0),
                false,
            )
            .unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrValue);
    }

    #[test]
    fn update_and_append() {
        let mut props = PropertySet::new("test");
        // Variable-length property: appending at the end is allowed
        props
            .add(
                constants::OfxImageEffectPropSupportedContexts,
                Property(vec![]),
                false,
            )
            .unwrap();
        props
            .update(
                constants::OfxImageEffectPropSupportedContexts,
                0,
                constants::OfxImageEffectContextFilter.into(),
            )
            .unwrap();
        props
            .update(
                constants::OfxImageEffectPropSupportedContexts,
                1,
                constants::OfxImageEffectContextGeneral.into(),
            )
            .unwrap();
        assert_eq!(
            props
                .length(constants::OfxImageEffectPropSupportedContexts)
                .unwrap(),
            2
        );
        // Past-the-end write is a bad index
        let err = props
            .update(
                constants::OfxImageEffectPropSupportedContexts,
                5,
                constants::OfxImageEffectContextPaint.into(),
            )
            .unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrBadIndex);
    }

    #[test]
    fn fixed_dims_do_not_append() {
        let mut props = PropertySet::new("test");
        props
            .add(constants::OfxPropTime, Property::from(0.0), false)
            .unwrap();
        let err = props
            .update(constants::OfxPropTime, 1, PropertyValue::Double(1.0))
            .unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrBadIndex);
    }

    #[test]
    fn get_bad_index() {
        let mut props = PropertySet::new("test");
        props
            .add(constants::OfxPropName, "x".into(), false)
            .unwrap();
        let err = props.get(constants::OfxPropName, 1).unwrap_err();
        assert_eq!(err.status, ofxstatus::ErrBadIndex);
    }

    #[test]
    fn cell_address_stable_across_unrelated_writes() {
        let mut props = PropertySet::new("test");
        props
            .add(
                constants::OfxImageEffectPropRenderScale,
                [1.0, 1.0].into(),
                false,
            )
            .unwrap();
        props
            .add(constants::OfxPropTime, Property::from(0.0), false)
            .unwrap();
        let addr = props
            .address(constants::OfxImageEffectPropRenderScale, 1)
            .unwrap();
        props
            .update(constants::OfxPropTime, 0, PropertyValue::Double(9.0))
            .unwrap();
        assert_eq!(
            props
                .address(constants::OfxImageEffectPropRenderScale, 1)
                .unwrap(),
            addr
        );
        // A write to the cell itself goes through the box, so even
        // that preserves the numeric cell address.
        props
            .update(
                constants::OfxImageEffectPropRenderScale,
                1,
                PropertyValue::Double(0.5),
            )
            .unwrap();
        assert_eq!(
            props
                .address(constants::OfxImageEffectPropRenderScale, 1)
                .unwrap(),
            addr
        );
        assert_eq!(
            props.get_double(constants::OfxImageEffectPropRenderScale, 1),
            Some(0.5)
        );
    }

    #[test]
    fn null_pointer_round_trips_as_zero() {
        let mut props = PropertySet::new("test");
        props
            .add(
                constants::OfxPropInstanceData,
                Property::from(std::ptr::null_mut::<c_void>()),
                false,
            )
            .unwrap();
        match props.get(constants::OfxPropInstanceData, 0).unwrap() {
            PropertyValue::Pointer(Addr(p)) => assert!(p.is_null()),
            v => panic!("expected pointer, got {:?}", v),
        }
    }

    #[test]
    fn string_address_is_nul_terminated_buffer() {
        let mut props = PropertySet::new("test");
        props
            .add(constants::OfxPropName, "abc".into(), false)
            .unwrap();
        let addr = props.address(constants::OfxPropName, 0).unwrap();
        let s = unsafe { std::ffi::CStr::from_ptr(addr as *const libc::c_char) };
        assert_eq!(s.to_str().unwrap(), "abc");
    }
}
