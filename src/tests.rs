#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::io::SeekFrom;
    use std::rc::Rc;

    use num_enum::{IntoPrimitive, TryFromPrimitive};

    use crate::{
        emit, parse, parse_with, sizeof, AlignTo, AlignedTo, Array, AtOffset, Codec, Context,
        Data, Encoding, Endian, Enum, EnumValue, Error, Fixed, Float, Generic, Implied, Int,
        Lazy, Nothing, Pad, Processed, Record, RecordType, Ref, RefMode, Seg, Str, Switch,
        Value, WithSize,
    };

    fn u8le() -> Int {
        Int::unsigned(8, Endian::Little)
    }

    fn u16le() -> Int {
        Int::unsigned(16, Endian::Little)
    }

    fn u32le() -> Int {
        Int::unsigned(32, Endian::Little)
    }

    /// Parse with a visible cursor, for cursor-discipline checks.
    fn parse_at(codec: &Rc<dyn Codec>, bytes: &[u8]) -> (Result<Value, Error>, u64) {
        let mut io = Cursor::new(bytes.to_vec());
        let mut ctx = Context::new(Rc::clone(codec));
        let result = parse_with(codec, &mut io, &mut ctx);
        (result, io.position())
    }

    #[test]
    fn little_endian_u32() {
        let value = parse(u32le(), [0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(value, Value::Int(0x0403_0201));
        let bytes = emit(u32le(), &value).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn c_string_utf8() {
        let codec: Rc<dyn Codec> = Rc::new(Str::c());
        let (value, pos) = parse_at(&codec, &[0x68, 0x69, 0x00, 0xFF]);
        assert_eq!(value.unwrap(), Value::Str("hi".to_owned()));
        assert_eq!(pos, 3);

        let bytes = emit(&codec, &Value::Str("hi".to_owned())).unwrap();
        assert_eq!(bytes, vec![0x68, 0x69, 0x00]);
    }

    #[test]
    fn pascal_string_u8_length() {
        let codec: Rc<dyn Codec> = Rc::new(Str::pascal());
        let value = parse(&codec, [0x03, 0x61, 0x62, 0x63]).unwrap();
        assert_eq!(value, Value::Str("abc".to_owned()));
        let bytes = emit(&codec, &value).unwrap();
        assert_eq!(bytes, vec![0x03, 0x61, 0x62, 0x63]);
    }

    #[test]
    fn sentinel_terminated_array() {
        let codec: Rc<dyn Codec> = Rc::new(Array::new(u8le()).sentinel(Value::Int(0)));
        let (value, pos) = parse_at(&codec, &[0x01, 0x02, 0x00, 0x03]);
        assert_eq!(
            value.unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(pos, 3);

        let bytes = emit(&codec, &Value::List(vec![Value::Int(1), Value::Int(2)])).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0x00]);
    }

    fn packet() -> Rc<RecordType> {
        let body = Rc::new(
            Switch::new()
                .option(Value::Int(1), u16le())
                .option(Value::Int(2), u32le()),
        );
        RecordType::build("Packet")
            .field("tag", u8le())
            .hook({
                let body = Rc::clone(&body);
                move |rec, _ctx| {
                    if let Some(tag) = rec.get("tag") {
                        body.set_selector(tag.clone());
                    }
                    Ok(())
                }
            })
            .field("body", &body)
            .finish()
    }

    #[test]
    fn tagged_switch_via_hook() {
        let packet = packet();

        let value = parse(&packet, [0x01, 0x34, 0x12]).unwrap();
        let rec = value.as_record().unwrap();
        assert_eq!(rec.get("tag"), Some(&Value::Int(1)));
        assert_eq!(rec.get("body"), Some(&Value::Int(0x1234)));

        let value = parse(&packet, [0x02, 0x78, 0x56, 0x34, 0x12]).unwrap();
        let rec = value.as_record().unwrap();
        assert_eq!(rec.get("body"), Some(&Value::Int(0x1234_5678)));

        // Emit drives the same hook, so the switch re-selects.
        let bytes = emit(&packet, &value).unwrap();
        assert_eq!(bytes, vec![0x02, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn union_of_two_shapes() {
        let union: Rc<RecordType> = RecordType::build("Both")
            .union()
            .field("a", u16le())
            .field("b", Array::new(u8le()).count(2))
            .finish();

        let codec: Rc<dyn Codec> = Rc::clone(&union) as Rc<dyn Codec>;
        let (value, pos) = parse_at(&codec, &[0xAA, 0xBB]);
        let value = value.unwrap();
        let rec = value.as_record().unwrap();
        assert_eq!(rec.get("a"), Some(&Value::Int(0xBBAA)));
        assert_eq!(
            rec.get("b"),
            Some(&Value::List(vec![Value::Int(0xAA), Value::Int(0xBB)]))
        );
        assert_eq!(pos, 2);
        assert_eq!(sizeof(&union, None).unwrap(), Some(2));

        let bytes = emit(&union, &value).unwrap();
        assert_eq!(bytes, vec![0xAA, 0xBB]);
    }

    #[test]
    fn sizeof_agrees_with_emit() {
        let cases: Vec<(Rc<dyn Codec>, Value)> = vec![
            (Rc::new(u32le()), Value::Int(7)),
            (Rc::new(Int::new(16, Endian::Big)), Value::Int(-2)),
            (Rc::new(Float::new(32, Endian::Little)), Value::Float(1.5)),
            (Rc::new(Str::c()), Value::Str("abc".to_owned())),
            (Rc::new(Str::pascal()), Value::Str("abc".to_owned())),
            (Rc::new(Fixed::new(vec![1, 2])), Value::Bytes(vec![1, 2])),
            (Rc::new(Pad::new(3)), Value::Null),
            (Rc::new(Data::sized(2)), Value::Bytes(vec![8, 9])),
            (
                Rc::new(Array::new(u16le()).count(2)),
                Value::List(vec![Value::Int(1), Value::Int(2)]),
            ),
        ];

        for (codec, value) in cases {
            let size = sizeof(&codec, Some(&value)).unwrap().unwrap();
            let bytes = emit(&codec, &value).unwrap();
            assert_eq!(bytes.len() as u64, size, "emit/sizeof disagree: {codec:?}");

            // Cursor discipline: parse consumes exactly the size.
            let (parsed, pos) = parse_at(&codec, &bytes);
            assert!(parsed.is_ok());
            assert_eq!(pos, size, "cursor off after parse: {codec:?}");
        }
    }

    #[test]
    fn round_trip_byte_stability() {
        let cases: Vec<(Rc<dyn Codec>, Vec<u8>)> = vec![
            (Rc::new(u32le()), vec![0xDE, 0xAD, 0xBE, 0xEF]),
            (Rc::new(Str::c()), vec![0x41, 0x42, 0x00]),
            (Rc::new(Str::pascal()), vec![0x02, 0x61, 0x62]),
            (
                Rc::new(Array::new(u8le()).sentinel(Value::Int(0))),
                vec![0x09, 0x08, 0x00],
            ),
            (Rc::new(Float::new(64, Endian::Big)), vec![0x3F, 0xF8, 0, 0, 0, 0, 0, 0]),
        ];

        for (codec, bytes) in cases {
            let value = parse(&codec, &bytes).unwrap();
            let out = emit(&codec, &value).unwrap();
            assert_eq!(out, bytes, "byte stability lost: {codec:?}");
        }
    }

    #[test]
    fn nothing_and_implied_consume_nothing() {
        let (value, pos) = parse_at(&(Rc::new(Nothing) as Rc<dyn Codec>), &[1, 2]);
        assert_eq!(value.unwrap(), Value::Null);
        assert_eq!(pos, 0);

        let implied: Rc<dyn Codec> = Rc::new(Implied::new(Value::Int(42)));
        let (value, pos) = parse_at(&implied, &[]);
        assert_eq!(value.unwrap(), Value::Int(42));
        assert_eq!(pos, 0);
        assert_eq!(emit(&implied, &Value::Int(42)).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn fixed_mismatch_reports_both_patterns() {
        let err = parse(Fixed::new(vec![0x4D, 0x5A]), [0x4D, 0x00]).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("4d 5a"), "{text}");
        assert!(text.contains("4d 00"), "{text}");
    }

    #[test]
    fn pad_skips_and_fills() {
        let codec: Rc<dyn Codec> = Rc::new(Pad::new(4).fill(vec![0xAB, 0xCD]));
        let (value, pos) = parse_at(&codec, &[0, 0, 0, 0, 9]);
        assert_eq!(value.unwrap(), Value::Null);
        assert_eq!(pos, 4);
        assert_eq!(emit(&codec, &Value::Null).unwrap(), vec![0xAB, 0xCD, 0xAB, 0xCD]);
    }

    #[test]
    fn data_to_end_reads_everything() {
        let value = parse(Data::to_end(), [1, 2, 3]).unwrap();
        assert_eq!(value, Value::Bytes(vec![1, 2, 3]));
        assert!(matches!(
            parse(Data::sized(4), [1, 2]),
            Err(Error::Traced { .. })
        ));
    }

    #[test]
    fn int_out_of_range_on_emit() {
        let err = emit(u8le(), &Value::Int(300)).unwrap_err();
        assert!(err.to_string().contains("300"), "{err}");
    }

    #[test]
    fn bool_over_u8() {
        let codec: Rc<dyn Codec> = Rc::new(Processed::boolean(u8le()));
        assert_eq!(parse(&codec, [0x01]).unwrap(), Value::Bool(true));
        assert_eq!(parse(&codec, [0x00]).unwrap(), Value::Bool(false));
        assert_eq!(emit(&codec, &Value::Bool(true)).unwrap(), vec![0x01]);
        // 2 maps to nothing.
        assert!(parse(&codec, [0x02]).is_err());
    }

    #[test]
    fn mapped_with_default() {
        let codec = Processed::mapped(
            u8le(),
            vec![(Value::Int(1), Value::Str("one".to_owned()))],
            Some(Value::Str("other".to_owned())),
        );
        let codec: Rc<dyn Codec> = Rc::new(codec);
        assert_eq!(parse(&codec, [0x09]).unwrap(), Value::Str("other".to_owned()));
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
    #[repr(u8)]
    enum Compression {
        None = 0,
        Deflate = 1,
    }

    #[test]
    fn enum_exhaustive_and_tolerant() {
        let strict: Rc<dyn Codec> = Rc::new(Enum::<Compression>::new(u8le()));
        let value = parse(&strict, [0x01]).unwrap();
        assert_eq!(value, Value::Enum(EnumValue::of(Compression::Deflate)));
        assert_eq!(emit(&strict, &value).unwrap(), vec![0x01]);

        let err = parse(&strict, [0x07]).unwrap_err();
        assert!(err.to_string().contains("7"), "{err}");

        let tolerant: Rc<dyn Codec> = Rc::new(Enum::<Compression>::tolerant(u8le()));
        assert_eq!(parse(&tolerant, [0x07]).unwrap(), Value::Int(7));
    }

    #[test]
    fn latin1_string() {
        let codec: Rc<dyn Codec> = Rc::new(Str::c().encoding(Encoding::Latin1));
        let value = parse(&codec, [0xE9, 0x00]).unwrap();
        assert_eq!(value, Value::Str("é".to_owned()));
        assert_eq!(emit(&codec, &value).unwrap(), vec![0xE9, 0x00]);

        let err = emit(&codec, &Value::Str("€".to_owned())).unwrap_err();
        assert!(matches!(
            err,
            Error::Traced { .. } | Error::EncodeChar(_)
        ));
    }

    #[test]
    fn exact_string_pads_to_width() {
        let codec: Rc<dyn Codec> = Rc::new(Str::c().length(4).exact());
        let (value, pos) = parse_at(&codec, &[0x61, 0x62, 0x00, 0x5A]);
        assert_eq!(value.unwrap(), Value::Str("ab".to_owned()));
        assert_eq!(pos, 4);

        let bytes = emit(&codec, &Value::Str("ab".to_owned())).unwrap();
        assert_eq!(bytes, vec![0x61, 0x62, 0x00, 0x00]);
        assert_eq!(sizeof(&codec, None).unwrap(), Some(4));

        assert!(emit(&codec, &Value::Str("abcde".to_owned())).is_err());
    }

    #[test]
    fn tuple_from_codec_list() {
        let spec: Vec<Rc<dyn Codec>> = vec![Rc::new(u8le()), Rc::new(u16le())];
        let value = parse(spec, [0x01, 0x02, 0x00]).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn array_stops_at_byte_size() {
        let codec: Rc<dyn Codec> = Rc::new(Array::new(u16le()).byte_size(4));
        let (value, pos) = parse_at(&codec, &[1, 0, 2, 0, 3, 0]);
        assert_eq!(
            value.unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(pos, 4);

        // Three elements do not fit four bytes.
        let err = emit(
            &codec,
            &Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("maximum size 4"), "{err}");
    }

    #[test]
    fn array_stops_cleanly_at_eof() {
        let value = parse(Array::new(u16le()), [1, 0, 2, 0]).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn at_offset_is_a_side_channel() {
        let codec: Rc<dyn Codec> = Rc::new(AtOffset::new(u8le(), SeekFrom::Start(3)));
        let (value, pos) = parse_at(&codec, &[0x00, 0x11, 0x22, 0x33]);
        assert_eq!(value.unwrap(), Value::Int(0x33));
        assert_eq!(pos, 0);
        assert_eq!(sizeof(&codec, None).unwrap(), Some(0));
    }

    #[test]
    fn ref_allocate_round_trip() {
        let file: Rc<RecordType> = RecordType::build("File")
            .field("payload", Ref::new(Data::sized(4), u32le()))
            .finish();

        let mut value = Record::new("File", vec!["payload".to_owned()]);
        value.set("payload", Value::Bytes(vec![1, 2, 3, 4]));
        let value = Value::Record(value);

        // The body region starts where the root layout ends.
        let bytes = emit(&file, &value).unwrap();
        assert_eq!(bytes, vec![4, 0, 0, 0, 1, 2, 3, 4]);

        assert_eq!(parse(&file, bytes).unwrap(), value);
    }

    #[test]
    fn ref_pinned_round_trip() {
        let reference = Rc::new(
            Ref::new(Data::sized(2), u8le()).mode(RefMode::Pinned),
        );
        reference.set_offset(3);

        let bytes = emit(&reference, &Value::Bytes(vec![9, 8])).unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 9, 8]);
        assert_eq!(
            parse(&reference, bytes).unwrap(),
            Value::Bytes(vec![9, 8])
        );
    }

    #[test]
    fn ref_pinned_without_offset_fails() {
        let reference = Ref::new(Data::sized(2), u8le()).mode(RefMode::Pinned);
        let err = emit(reference, &Value::Bytes(vec![9, 8])).unwrap_err();
        assert!(err.to_string().contains("offset not set"), "{err}");
    }

    #[test]
    fn with_size_bounds_inner_reads() {
        let codec: Rc<dyn Codec> = Rc::new(WithSize::new(Data::to_end(), 3));
        let (value, pos) = parse_at(&codec, &[1, 2, 3, 4, 5]);
        assert_eq!(value.unwrap(), Value::Bytes(vec![1, 2, 3]));
        assert_eq!(pos, 3);
    }

    #[test]
    fn with_size_exact_skips_slack() {
        let codec: Rc<dyn Codec> = Rc::new(WithSize::new(Str::c(), 6).exact());
        let (value, pos) = parse_at(&codec, &[0x68, 0x69, 0x00, 0xFF, 0xFF, 0xFF, 0x77]);
        assert_eq!(value.unwrap(), Value::Str("hi".to_owned()));
        assert_eq!(pos, 6);
        assert_eq!(sizeof(&codec, None).unwrap(), Some(6));
    }

    #[test]
    fn with_size_rejects_oversized_writes() {
        let codec: Rc<dyn Codec> = Rc::new(WithSize::new(Data::to_end(), 2));
        let err = emit(&codec, &Value::Bytes(vec![1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("limit"), "{err}");
    }

    #[test]
    fn alignment_before_and_after() {
        let pre: Vec<Rc<dyn Codec>> = vec![
            Rc::new(u8le()),
            Rc::new(AlignedTo::new(u8le(), 4)),
        ];
        let value = parse(pre, [0x01, 0, 0, 0, 0x02]).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(2)]));

        let post: Rc<dyn Codec> = Rc::new(AlignTo::new(u8le(), 4));
        let (value, pos) = parse_at(&post, &[0x05, 0, 0, 0]);
        assert_eq!(value.unwrap(), Value::Int(5));
        assert_eq!(pos, 4);
        assert_eq!(emit(&post, &Value::Int(5)).unwrap(), vec![0x05, 0, 0, 0]);
    }

    #[test]
    fn lazy_defers_and_caches() {
        let codec: Rc<dyn Codec> = Rc::new(Lazy::new(u16le()));
        let (value, pos) = parse_at(&codec, &[0x01, 0x00, 0xFF]);
        let value = value.unwrap();
        assert_eq!(pos, 2);

        let Value::Lazy(entry) = &value else {
            panic!("expected a lazy entry, got {value:?}");
        };
        assert_eq!(entry.position(), 0);
        assert_eq!(entry.force().unwrap(), Value::Int(1));
        // Second force hits the cache.
        assert_eq!(entry.force().unwrap(), Value::Int(1));

        assert_eq!(emit(&codec, &value).unwrap(), vec![0x01, 0x00]);
        assert_eq!(sizeof(&codec, Some(&value)).unwrap(), Some(2));
    }

    #[test]
    fn lazy_requires_a_knowable_size() {
        let err = parse(Lazy::new(Str::c()), [0x61, 0x00]).unwrap_err();
        assert!(err.to_string().contains("Size not known"), "{err}");

        let sized = parse(Lazy::sized(Str::c(), 2), [0x61, 0x00]).unwrap();
        let Value::Lazy(entry) = sized else {
            panic!("expected a lazy entry");
        };
        assert_eq!(entry.force().unwrap(), Value::Str("a".to_owned()));
    }

    #[test]
    fn record_inheritance_prepends_base_fields() {
        let header: Rc<RecordType> = RecordType::build("Header")
            .field("magic", Fixed::new(vec![0x4D]))
            .finish();
        let file: Rc<RecordType> = RecordType::build("File")
            .base(&header)
            .field("size", u16le())
            .finish();

        let value = parse(&file, [0x4D, 0x05, 0x00]).unwrap();
        let rec = value.as_record().unwrap();
        assert_eq!(rec.type_name(), "File");
        let names: Vec<&str> = rec.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["magic", "size"]);
        assert_eq!(rec.get("size"), Some(&Value::Int(5)));
    }

    #[test]
    fn union_base_forces_union() {
        let base: Rc<RecordType> = RecordType::build("Raw")
            .union()
            .field("bytes", Data::sized(2))
            .finish();
        let both = RecordType::build("Both")
            .base(&base)
            .field("word", u16le())
            .finish();
        assert!(both.is_union());
    }

    #[test]
    fn generic_slot_instantiation() {
        let item = Generic::new();
        let boxed: Rc<RecordType> = RecordType::build("Boxed")
            .generic(&item)
            .field("value", &item)
            .finish();

        let of_u16 = boxed.instantiate([Rc::new(u16le()) as Rc<dyn Codec>]).unwrap();
        let value = parse(&of_u16, [0x22, 0x11]).unwrap();
        assert_eq!(
            value.as_record().unwrap().get("value"),
            Some(&Value::Int(0x1122))
        );
        assert_eq!(item.depth(), 0);

        let of_u8 = boxed.instantiate([Rc::new(u8le()) as Rc<dyn Codec>]).unwrap();
        let value = parse(&of_u8, [0x07]).unwrap();
        assert_eq!(
            value.as_record().unwrap().get("value"),
            Some(&Value::Int(7))
        );

        // A third binding has no slot to land in.
        assert!(of_u16
            .instantiate([Rc::new(u8le()) as Rc<dyn Codec>])
            .is_err());
    }

    #[test]
    fn unresolved_generic_fails() {
        let hole = Generic::new();
        let rec: Rc<RecordType> = RecordType::build("Open")
            .generic(&hole)
            .field("value", &hole)
            .finish();
        // No instantiation, nothing bound.
        let err = parse(&rec, [0x01]).unwrap_err();
        assert!(err.to_string().contains("Unresolved"), "{err}");
        assert_eq!(hole.depth(), 0);
    }

    #[test]
    fn partial_record_stops_at_eof() {
        let rec: Rc<RecordType> = RecordType::build("Partial")
            .partial()
            .field("a", u8le())
            .field("b", u16le())
            .finish();

        let value = parse(&rec, [0x05]).unwrap();
        let parsed = value.as_record().unwrap();
        assert_eq!(parsed.get("a"), Some(&Value::Int(5)));
        assert_eq!(parsed.get("b"), Some(&Value::Null));

        // Without the flag the same input is fatal.
        let strict: Rc<RecordType> = RecordType::build("Strict")
            .field("a", u8le())
            .field("b", u16le())
            .finish();
        assert!(parse(&strict, [0x05]).is_err());
    }

    #[test]
    fn skip_fields_never_reach_the_stream() {
        let rec: Rc<RecordType> = RecordType::build("Sparse")
            .field("a", u8le())
            .skip("comment")
            .field("b", u8le())
            .finish();
        let value = parse(&rec, [0x01, 0x02]).unwrap();
        let parsed = value.as_record().unwrap();
        assert_eq!(parsed.get("comment"), Some(&Value::Null));
        assert_eq!(parsed.get("b"), Some(&Value::Int(2)));
        assert_eq!(sizeof(&rec, None).unwrap(), Some(2));
    }

    #[test]
    fn error_path_points_at_the_failure() {
        let inner: Rc<RecordType> = RecordType::build("Inner")
            .field("magic", Fixed::new(vec![0xAA]))
            .finish();
        let outer: Rc<RecordType> = RecordType::build("Outer")
            .field("pad", u8le())
            .field("hdr", &inner)
            .finish();

        let err = parse(&outer, [0x00, 0x55]).unwrap_err();
        assert_eq!(
            err.path(),
            Some(
                &[
                    Seg::Name("hdr".to_owned()),
                    Seg::Name("magic".to_owned())
                ][..]
            )
        );
        let text = err.to_string();
        assert!(text.starts_with("[hdr.magic] FixedMismatch:"), "{text}");
    }

    #[test]
    fn array_error_paths_carry_the_index() {
        let codec: Rc<dyn Codec> = Rc::new(Array::new(Fixed::new(vec![0x01])).count(3));
        let err = parse(&codec, [0x01, 0x02, 0x01]).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("[[1]] FixedMismatch:"), "{text}");
    }

    #[test]
    fn path_stack_balanced_after_failure() {
        let rec: Rc<RecordType> = RecordType::build("R")
            .field("a", Fixed::new(vec![0x01]))
            .finish();
        let codec: Rc<dyn Codec> = Rc::clone(&rec) as Rc<dyn Codec>;

        let mut io = Cursor::new(vec![0xFF]);
        let mut ctx = Context::new(Rc::clone(&codec));
        assert!(parse_with(&codec, &mut io, &mut ctx).is_err());
        assert!(ctx.path().is_empty());
    }

    #[test]
    fn generic_stack_balanced_after_failure() {
        let hole = Generic::new();
        let rec: Rc<RecordType> = RecordType::build("R")
            .generic(&hole)
            .field("value", &hole)
            .finish();
        let bound = rec
            .instantiate([Rc::new(Fixed::new(vec![0x01])) as Rc<dyn Codec>])
            .unwrap();

        assert!(parse(&bound, [0xFF]).is_err());
        assert_eq!(hole.depth(), 0);
    }

    #[test]
    fn switch_fallback_and_bad_selector() {
        let with_fallback: Rc<dyn Codec> = Rc::new(
            Switch::new()
                .option(Value::Int(1), u16le())
                .fallback(u8le())
                .preset(Value::Int(9)),
        );
        assert_eq!(parse(&with_fallback, [0x07]).unwrap(), Value::Int(7));

        let strict = Switch::new().option(Value::Int(1), u16le());
        strict.set_selector(Value::Int(9));
        let err = parse(strict, [0x07]).unwrap_err();
        assert!(err.to_string().contains("No option"), "{err}");

        let unset = Switch::new().option(Value::Int(1), u16le());
        let err = parse(unset, [0x07]).unwrap_err();
        assert!(err.to_string().contains("Selector not set"), "{err}");
    }

    #[test]
    fn record_equality_is_structural() {
        let packet = packet();
        let first = parse(&packet, [0x01, 0x34, 0x12]).unwrap();
        let second = parse(&packet, [0x01, 0x34, 0x12]).unwrap();
        let third = parse(&packet, [0x01, 0x35, 0x12]).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, third);
    }
}
